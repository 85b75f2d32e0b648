//! SQLite storage bootstrap, sessions and schema initialization.
//!
//! # Responsibility
//! - Build store handles from `DatabaseConfig` and hand out sessions.
//! - Apply schema migrations in deterministic order.
//! - Expose schema inspection for initialization checks.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Every session connection has `foreign_keys=ON`.
//! - Core code must not read/write application data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod session;

pub use open::{get_db_connection, get_session, init_database, reset_database, DatabaseConnection};
pub use session::Session;

/// Tables created by `init_database`, in dependency order.
pub const EXPECTED_TABLES: [&str; 6] = [
    "patients",
    "health_metrics",
    "medical_images",
    "biomedical_signals",
    "correlation_results",
    "spectrum_analysis",
];

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Store is unreachable or the schema cannot be created/inspected.
    StorageInit {
        location: String,
        reason: String,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::StorageInit { location, reason } => {
                write!(f, "failed to initialize storage at {location}: {reason}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::StorageInit { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
