//! SQLite storage bootstrap, schema migrations and change tracking.
//!
//! # Responsibility
//! - Open and configure SQLite connections for SediciTasks core.
//! - Apply schema migrations in deterministic order.
//! - Share one connection between repositories and notify live queries.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Change notifications are only published for writes that touched rows.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod store;

pub use open::{open_db, open_db_in_memory};
pub use store::{Database, LiveQuery};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure below the task repository.
///
/// Besides raw SQLite errors this covers a task file written by a newer
/// build and a live query whose blocking worker died before answering.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    LiveQueryAborted(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::LiveQueryAborted(reason) => write!(f, "live query worker aborted: {reason}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
