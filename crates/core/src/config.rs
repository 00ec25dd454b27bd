//! Configuration management for PaperDesk
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/<env>, config/local)
//! - Default values
//!
//! Source API keys are additionally read from their plain environment
//! variables (SEMANTIC_SCHOLAR_API_KEY and friends); an absent key is an
//! empty string and never blocks mock operation.

use crate::errors::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Paper source credentials
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections. The store assumes single-writer
    /// discipline, so this defaults to one.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Busy timeout in seconds before SQLite gives up on a locked database
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

/// Opaque credential strings for the named paper sources. The core never
/// validates these; the mock adapters only carry them along.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub semantic_scholar_api_key: String,

    #[serde(default)]
    pub arxiv_api_key: String,

    #[serde(default)]
    pub pubmed_api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level filter (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_database_url() -> String {
    "sqlite:paperdesk.db?mode=rwc".to_string()
}
fn default_max_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_busy_timeout() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl SourcesConfig {
    /// Fill any unset key from its plain environment variable.
    pub fn apply_env_keys(&mut self) {
        if self.semantic_scholar_api_key.is_empty() {
            self.semantic_scholar_api_key =
                std::env::var("SEMANTIC_SCHOLAR_API_KEY").unwrap_or_default();
        }
        if self.arxiv_api_key.is_empty() {
            self.arxiv_api_key = std::env::var("ARXIV_API_KEY").unwrap_or_default();
        }
        if self.pubmed_api_key.is_empty() {
            self.pubmed_api_key = std::env::var("PUBMED_API_KEY").unwrap_or_default();
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        // Pull in a .env file when present; ignored otherwise.
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=sqlite:other.db
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.sources.apply_env_keys();
        Ok(config)
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connect_timeout_secs)
    }

    /// Get busy timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.database.busy_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            sources: SourcesConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}
