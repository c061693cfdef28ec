//! Shared connection handle and table invalidation tracking.
//!
//! # Responsibility
//! - Share one migrated connection between repositories and live queries.
//! - Publish a change version whenever a write touches at least one row.
//! - Re-run registered queries when the change version moves.
//!
//! # Invariants
//! - Writes that change zero rows never publish a new version.
//! - A `LiveQuery` yields the current result first, then one result per
//!   observed version change. Intermediate versions may be coalesced.
//! - Live queries never touch the connection on an async worker thread.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

type SharedQuery<T, E> = Arc<dyn Fn(&Connection) -> Result<T, E> + Send + Sync>;

/// Cloneable handle to the application database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    changes: Arc<watch::Sender<u64>>,
}

impl Database {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            conn: Arc::new(Mutex::new(conn)),
            changes: Arc::new(changes),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens (and migrates) a fresh in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Runs a read-only closure against the connection.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Runs a write closure returning the number of changed rows.
    ///
    /// Live queries are notified only when the count is non-zero.
    pub fn write<E>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<usize, E>,
    ) -> Result<usize, E> {
        let changed = {
            let mut conn = self.conn.lock();
            f(&mut conn)?
        };
        if changed > 0 {
            self.changes
                .send_modify(|version| *version = version.wrapping_add(1));
        }
        Ok(changed)
    }

    /// Current change version. Starts at zero.
    pub fn change_version(&self) -> u64 {
        *self.changes.borrow()
    }

    /// Registers a query that is re-run after every published change.
    pub fn live<T, E>(
        &self,
        query: impl Fn(&Connection) -> Result<T, E> + Send + Sync + 'static,
    ) -> LiveQuery<T, E> {
        LiveQuery {
            conn: Arc::clone(&self.conn),
            changes: self.changes.subscribe(),
            query: Arc::new(query),
            primed: false,
        }
    }
}

/// Query result stream driven by the change version of a [`Database`].
///
/// Each run takes the connection lock on the blocking pool.
pub struct LiveQuery<T, E> {
    conn: Arc<Mutex<Connection>>,
    changes: watch::Receiver<u64>,
    query: SharedQuery<T, E>,
    primed: bool,
}

impl<T, E> LiveQuery<T, E>
where
    T: Send + 'static,
    E: From<DbError> + Send + 'static,
{
    /// Waits for the next result.
    ///
    /// The first call returns immediately with the current result. Returns
    /// `None` once every `Database` handle has been dropped.
    pub async fn next(&mut self) -> Option<Result<T, E>> {
        if self.primed {
            self.changes.changed().await.ok()?;
        } else {
            self.primed = true;
        }

        let conn = Arc::clone(&self.conn);
        let query = Arc::clone(&self.query);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            query(&conn)
        })
        .await;

        Some(result.unwrap_or_else(|err| Err(DbError::LiveQueryAborted(err.to_string()).into())))
    }
}
