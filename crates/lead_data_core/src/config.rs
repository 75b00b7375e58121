//! Runtime configuration for opening lead storage.
//!
//! # Responsibility
//! - Describe where the lead database lives and how long writers wait on locks.
//! - Optionally bootstrap file logging for hosts that do not own a logger.
//!
//! # Invariants
//! - A missing `db_path` means an in-memory database.
//! - Unknown JSON fields are rejected.

use crate::db::{open_db_with_busy_timeout, DbError, DEFAULT_BUSY_TIMEOUT};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Storage and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeadDataConfig {
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub log_level: String,
    /// Absolute directory for rolling logs. Logging stays untouched when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LeadDataConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: u64::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(5_000),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Configuration loading/open failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Logging(LoggingError),
    Db(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl LeadDataConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Initializes logging (when `log_dir` is set) and opens a schema-ready
    /// connection.
    pub fn open(&self) -> Result<Connection, ConfigError> {
        if let Some(log_dir) = self.log_dir.as_deref() {
            init_logging(&self.log_level, log_dir)?;
        }
        Ok(open_db_with_busy_timeout(
            self.db_path.as_deref(),
            self.busy_timeout(),
        )?)
    }
}
