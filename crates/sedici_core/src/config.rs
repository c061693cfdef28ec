//! Runtime configuration from the environment.
//!
//! # Invariants
//! - Blank values behave as unset.
//! - The resolved log level is always one the logger accepts.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "SEDICI_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SEDICI_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SEDICI_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "sedici_tasks.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel { value: String },
    RelativeLogDir { value: PathBuf },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel { value } => {
                write!(f, "{ENV_LOG_LEVEL}=`{value}` is not a supported log level")
            }
            Self::RelativeLogDir { value } => write!(
                f,
                "{ENV_LOG_DIR}=`{}` must be an absolute path",
                value.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Reads the `SEDICI_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let db_path = value(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let log_level = match value(ENV_LOG_LEVEL) {
            Some(raw) => {
                normalize_level(&raw).map_err(|_| ConfigError::InvalidLogLevel { value: raw })?
            }
            None => default_log_level(),
        };

        let log_dir = match value(ENV_LOG_DIR).map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => {
                return Err(ConfigError::RelativeLogDir { value: dir })
            }
            other => other,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}

/// `<temp_dir>/sedici_tasks.sqlite3`.
pub fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}
