//! Mail Triage - Email Classification and Dashboard Statistics
//!
//! A Rust library for capturing inbound emails, classifying them by
//! Brazilian state and municipality, and deriving dashboard statistics.
//!
//! # Features
//!
//! - Webhook payload ingestion with recipient consolidation
//! - Manual entry with form validation
//! - Single and batch classification (best-effort, non-transactional)
//! - Dashboard statistics: totals, per-state counts, top recipients,
//!   seven-day send trend
//! - CSV export with proper field quoting
//! - IBGE reference-data client with process-lifetime caching

/// Process-lifetime reference cache
pub mod cache;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// CSV export
pub mod export;
/// Timestamp and location formatting
pub mod formatters;
/// Inbound webhook payload adapter
pub mod inbound;
/// IBGE reference-data client
pub mod locations;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Repository pattern for data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Orchestration services
pub mod service;
/// Aggregation engine for dashboard statistics
pub mod stats;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{Result, TriageError};
pub use models::{DashboardStats, EmailFilter, EmailRecord, Profile};
pub use repository::{EmailRepository, SqliteEmailRepository};
pub use service::{EmailService, ProfileService};
