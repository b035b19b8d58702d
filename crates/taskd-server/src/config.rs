// ABOUTME: Configuration loading and validation for the taskd server.
// ABOUTME: Reads TASKD_* environment variables and fills in defaults for the database file and bind address.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use taskd_store::DatabaseOptions;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TASKD_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("TASKD_SAVE_ATTEMPTS must be a positive integer, got {0:?}")]
    InvalidSaveAttempts(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct TaskdConfig {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub save_attempts: u32,
}

impl TaskdConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - TASKD_DB_PATH: database file (default: ~/.taskd/db.json)
    /// - TASKD_BIND: socket address to bind (default: 127.0.0.1:3000)
    /// - TASKD_SAVE_ATTEMPTS: attempts per save before giving up (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("TASKD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".taskd")
                    .join("db.json")
            });

        let bind_str =
            std::env::var("TASKD_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let save_attempts = match std::env::var("TASKD_SAVE_ATTEMPTS") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidSaveAttempts(raw)),
            },
            Err(_) => DatabaseOptions::default().save_attempts,
        };

        Ok(Self {
            db_path,
            bind,
            save_attempts,
        })
    }

    /// Database options derived from this configuration.
    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            save_attempts: self.save_attempts,
            retry_backoff: Duration::from_millis(50),
        }
    }
}
