//! Error types for the mail-triage library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the mail-triage application.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Reference API returned a non-success response
    #[error("failed to fetch {0}")]
    ReferenceFetch(&'static str),

    /// Reference API transport errors
    #[error("Reference API error: {0}")]
    Http(#[from] reqwest::Error),

    /// Inbound payload rejected at the boundary (400-equivalent)
    #[error("Payload rejected: {reason}")]
    Rejected {
        /// Machine-readable rejection reason
        reason: String,
    },

    /// Validation errors on user-submitted forms
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `TriageError`
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Build a boundary rejection with a machine-readable reason code.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        TriageError::Rejected { reason: reason.into() }
    }
}

impl From<anyhow::Error> for TriageError {
    fn from(err: anyhow::Error) -> Self {
        TriageError::Other(err.to_string())
    }
}
