//! Schema steps for the task database.
//!
//! # Responsibility
//! - List the numbered SQL steps that build the `Tasks` schema.
//! - Bring a connection from its recorded version up to the newest step.
//!
//! # Invariants
//! - Step numbers start at 1 and increase by one.
//! - A run either applies every pending step and records the final number in
//!   `PRAGMA user_version`, or leaves the database untouched.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "tasks",
        sql: include_str!("0001_tasks.sql"),
    },
    SchemaStep {
        version: 2,
        name: "tasks_order_index",
        sql: include_str!("0002_tasks_order_index.sql"),
    },
];

/// Newest schema version this build can produce.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Applies every step newer than the connection's recorded version.
///
/// A database written by a newer build is refused instead of being
/// downgraded.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let recorded: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let latest = latest_version();

    if recorded > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: recorded,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > recorded)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        debug!(
            "event=db_migrate module=db status=step version={} name={}",
            step.version, step.name
        );
        tx.execute_batch(step.sql)?;
    }
    tx.pragma_update(None, "user_version", latest)?;
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={recorded} to_version={latest}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, SCHEMA_STEPS};

    #[test]
    fn steps_are_numbered_consecutively_from_one() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version() as usize, SCHEMA_STEPS.len());
    }
}
