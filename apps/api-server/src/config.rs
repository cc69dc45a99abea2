//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider for the testimonial collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.eq_ignore_ascii_case("sqlite") {
            Ok(Self::Sqlite)
        } else if s.eq_ignore_ascii_case("memory") {
            Ok(Self::Memory)
        } else {
            Err(ConfigError {
                field: "STORAGE_PROVIDER",
                message: format!("Unknown provider '{}', expected memory or sqlite", s),
            })
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3001)
    pub port: u16,
    /// CORS allow origin
    pub cors_allow_origin: HeaderValue,
    /// Storage provider
    pub storage_provider: StorageProvider,
    /// SQLite database path (when using sqlite storage)
    pub db_path: PathBuf,
    /// Static portfolio configuration file
    pub portfolio_config_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        // Port
        let port = match get("PORT") {
            Some(s) => s.parse::<u16>().map_err(|e| ConfigError {
                field: "PORT",
                message: format!("Invalid port '{}': {}", s, e),
            })?,
            None => 3001,
        };

        // CORS allow origin
        let cors_origin_str = get("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".into());
        let cors_allow_origin = if cors_origin_str == "*" {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(&cors_origin_str).map_err(|e| ConfigError {
                field: "CORS_ALLOW_ORIGIN",
                message: format!("Invalid header value '{}': {}", cors_origin_str, e),
            })?
        };

        // Storage provider
        let storage_provider =
            StorageProvider::parse(&get("STORAGE_PROVIDER").unwrap_or_else(|| "sqlite".into()))?;

        // DB path (for sqlite)
        let db_path = PathBuf::from(
            get("DB_PATH").unwrap_or_else(|| "./data/testimonials.db".into()),
        );

        // Portfolio config path
        let portfolio_config_path = PathBuf::from(
            get("PORTFOLIO_CONFIG_PATH").unwrap_or_else(|| "./data/portfolio-config.json".into()),
        );

        // Log format
        let log_format =
            LogFormat::from_str(&get("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            port,
            cors_allow_origin,
            storage_provider,
            db_path,
            portfolio_config_path,
            log_format,
        })
    }

    /// Log warnings about configuration that loses data or is wide open.
    pub fn warn_if_insecure(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: submitted testimonials are lost on restart."
            );
        }
        if self.cors_allow_origin == HeaderValue::from_static("*") {
            tracing::warn!(
                "CORS_ALLOW_ORIGIN not set: any origin may submit testimonials. \
                 Set it to the site origin in production."
            );
        }
    }
}
