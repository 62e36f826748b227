//! Configuration management
//!
//! Layered configuration: built-in defaults, then optional `config/default`
//! and `config/local` files (YAML/TOML/JSON), then `MAIL_TRIAGE__*`
//! environment variables. The result is validated before use.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Reference-data API settings
    pub reference: ReferenceConfig,
    /// Inbound webhook settings
    pub inbound: InboundConfig,
    /// CSV export settings
    pub export: ExportConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path or `sqlite:` URL
    pub url: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace | debug | info | warn | error)
    pub level: String,
    /// Optional log file path; console-only when absent
    pub file_path: Option<String>,
    /// Console format: "text" or "json"
    pub format: String,
}

/// Reference-data API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Base URL of the localidades API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Inbound webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundConfig {
    /// The system inbox address, excluded from consolidated recipients
    pub system_address: String,
}

/// CSV export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Default output directory for exports
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "data/mail-triage.db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            reference: ReferenceConfig {
                base_url: crate::locations::DEFAULT_BASE_URL.to_string(),
                timeout_secs: 30,
            },
            inbound: InboundConfig {
                system_address: "triagem@mail-triage.local".to_string(),
            },
            export: ExportConfig {
                output_directory: "./output".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(
                Config::try_from(&AppConfig::default())
                    .map_err(|e| TriageError::InvalidConfig(e.to_string()))?,
            )
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("MAIL_TRIAGE").separator("__"))
            .build()
            .map_err(|e| TriageError::InvalidConfig(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| TriageError::InvalidConfig(e.to_string()))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(TriageError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                self.logging.level
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(TriageError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {valid_formats:?}",
                self.logging.format
            )));
        }

        if self.database.url.trim().is_empty() {
            return Err(TriageError::InvalidConfig("database.url cannot be empty".to_string()));
        }

        if self.reference.base_url.trim().is_empty() {
            return Err(TriageError::InvalidConfig(
                "reference.base_url cannot be empty".to_string(),
            ));
        }

        if self.reference.timeout_secs == 0 {
            return Err(TriageError::InvalidConfig(
                "reference.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get database URL from environment or config
    #[must_use]
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
