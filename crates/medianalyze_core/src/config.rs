//! Store configuration.
//!
//! # Responsibility
//! - Describe where the store lives and how session connections are tuned.
//! - Resolve configuration from the process environment.
//!
//! # Invariants
//! - `MEDIANALYZE_DB_PATH=:memory:` selects an isolated in-memory store.
//! - Invalid environment values are reported, never silently replaced.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the database file (or `:memory:`).
pub const DB_PATH_ENV: &str = "MEDIANALYZE_DB_PATH";
/// Environment variable overriding the busy timeout in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "MEDIANALYZE_BUSY_TIMEOUT_MS";
/// Database file used when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "data/medanalyze.db";
/// Busy timeout used when nothing else is configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MEMORY_MARKER: &str = ":memory:";

/// Physical location of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite database file. The parent directory is created on connect.
    File(PathBuf),
    /// Private in-memory store shared by all sessions of one connection.
    Memory,
}

/// Connection settings for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
    /// Applied to every session connection.
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::file(DEFAULT_DB_PATH)
    }
}

impl DatabaseConfig {
    /// File-backed store at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Isolated in-memory store.
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Reads `MEDIANALYZE_DB_PATH` and `MEDIANALYZE_BUSY_TIMEOUT_MS`.
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DatabaseConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(DB_PATH_ENV) {
            Some(raw) => Self::from_path_value(&raw)?,
            None => Self::default(),
        };

        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            config.busy_timeout = parse_busy_timeout(&raw)?;
        }

        Ok(config)
    }

    fn from_path_value(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyValue(DB_PATH_ENV));
        }
        if trimmed == MEMORY_MARKER {
            return Ok(Self::in_memory());
        }
        Ok(Self::file(trimmed))
    }
}

/// Invalid store configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but blank.
    EmptyValue(&'static str),
    /// Variable cannot be parsed into the expected type.
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue(key) => write!(f, "{key} is set but empty"),
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

fn parse_busy_timeout(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidValue {
            key: BUSY_TIMEOUT_ENV,
            value: raw.to_string(),
        })
}
