//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and field-level update APIs over the `Tasks` table.
//! - Translate between `Task` values and rows, including timestamp text.
//! - Expose live queries that re-run when the table changes.
//!
//! # Invariants
//! - Inserting an existing id is ignored; the stored row wins.
//! - Updates and deletes of absent ids are silent no-ops.
//! - Field updates never move `updated_at` backwards.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{Database, DbError, LiveQuery};
use crate::model::task::{
    now_offset, start_of_local_day, NewTask, Task, TaskId, TaskValidationError,
};
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    is_checked,
    created_at,
    updated_at,
    expires_on
FROM Tasks";

// NULL sorts lowest in SQLite, so tasks without expiration come last.
const TASK_ORDER_SQL: &str = "ORDER BY
    expires_on DESC,
    created_at DESC,
    updated_at DESC,
    title,
    description,
    is_checked,
    id";

const TASK_INSERT_SQL: &str = "INSERT OR IGNORE INTO Tasks (
    id,
    title,
    description,
    is_checked,
    created_at,
    updated_at,
    expires_on
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for task operations.
///
/// Implementations must be shareable across the blocking pool and the
/// view-model tasks.
pub trait TaskRepository: Send + Sync {
    /// Persists a fresh unchecked task and returns its id.
    fn save_new_task(&self, new_task: &NewTask) -> RepoResult<TaskId>;
    /// Inserts a full record; an existing id is left untouched.
    fn insert_task(&self, task: &Task) -> RepoResult<()>;
    /// Inserts many records in one transaction with the same policy.
    fn insert_tasks(&self, tasks: &[Task]) -> RepoResult<()>;
    /// Replaces every mutable field of an existing record.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn delete_task_by_id(&self, id: TaskId) -> RepoResult<()>;
    fn set_task_checked_by_id(&self, id: TaskId, is_checked: bool) -> RepoResult<()>;
    fn set_task_title_by_id(&self, id: TaskId, title: &str) -> RepoResult<()>;
    fn set_task_description_by_id(&self, id: TaskId, description: &str) -> RepoResult<()>;
    /// Sets or clears (`None`) the expiration day.
    fn set_task_expiration_by_id(
        &self,
        id: TaskId,
        expires_on: Option<NaiveDate>,
    ) -> RepoResult<()>;
    fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists every task in list order.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn observe_tasks(&self) -> LiveQuery<Vec<Task>, RepoError>;
    fn observe_task_by_id(&self, id: TaskId) -> LiveQuery<Option<Task>, RepoError>;
}

/// SQLite-backed task repository.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    db: Database,
}

impl SqliteTaskRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Field updates share one shape: set a column and bump `updated_at`.
    fn update_field(
        &self,
        sql: &str,
        id: TaskId,
        value: &dyn rusqlite::ToSql,
    ) -> RepoResult<()> {
        let now = format_instant(&now_offset());
        self.db.write(|conn| {
            conn.execute(sql, params![value, now, id.to_string()])
                .map_err(RepoError::from)
        })?;
        Ok(())
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn save_new_task(&self, new_task: &NewTask) -> RepoResult<TaskId> {
        let task = new_task.clone().into_task(now_offset());
        self.insert_task(&task)?;
        Ok(task.id)
    }

    fn insert_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;
        self.db.write(|conn| insert_row(conn, task))?;
        Ok(())
    }

    fn insert_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        for task in tasks {
            task.validate()?;
        }

        self.db.write(|conn| {
            let tx = conn.transaction()?;
            let mut changed = 0;
            for task in tasks {
                changed += insert_row(&tx, task)?;
            }
            tx.commit()?;
            Ok::<_, RepoError>(changed)
        })?;
        Ok(())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        self.db.write(|conn| {
            conn.execute(
                "UPDATE Tasks
                 SET
                    title = ?1,
                    description = ?2,
                    is_checked = ?3,
                    expires_on = ?4,
                    updated_at = MAX(updated_at, ?5)
                 WHERE id = ?6;",
                params![
                    task.title.as_str(),
                    task.description.as_str(),
                    task.is_checked,
                    task.expires_on.as_ref().map(format_offset),
                    format_instant(&task.updated_at),
                    task.id.to_string(),
                ],
            )
            .map_err(RepoError::from)
        })?;
        Ok(())
    }

    fn delete_task_by_id(&self, id: TaskId) -> RepoResult<()> {
        self.db.write(|conn| {
            conn.execute("DELETE FROM Tasks WHERE id = ?1;", [id.to_string()])
                .map_err(RepoError::from)
        })?;
        Ok(())
    }

    fn set_task_checked_by_id(&self, id: TaskId, is_checked: bool) -> RepoResult<()> {
        self.update_field(
            "UPDATE Tasks SET is_checked = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3;",
            id,
            &is_checked,
        )
    }

    fn set_task_title_by_id(&self, id: TaskId, title: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE Tasks SET title = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3;",
            id,
            &title,
        )
    }

    fn set_task_description_by_id(&self, id: TaskId, description: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE Tasks SET description = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3;",
            id,
            &description,
        )
    }

    fn set_task_expiration_by_id(
        &self,
        id: TaskId,
        expires_on: Option<NaiveDate>,
    ) -> RepoResult<()> {
        let expires_on = expires_on.map(|date| format_offset(&start_of_local_day(date)));
        self.update_field(
            "UPDATE Tasks SET expires_on = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3;",
            id,
            &expires_on,
        )
    }

    fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.db.read(|conn| select_task_by_id(conn, id))
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.db.read(select_all_tasks)
    }

    fn observe_tasks(&self) -> LiveQuery<Vec<Task>, RepoError> {
        self.db.live(select_all_tasks)
    }

    fn observe_task_by_id(&self, id: TaskId) -> LiveQuery<Option<Task>, RepoError> {
        self.db.live(move |conn| select_task_by_id(conn, id))
    }
}

fn insert_row(conn: &Connection, task: &Task) -> RepoResult<usize> {
    let changed = conn.execute(
        TASK_INSERT_SQL,
        params![
            task.id.to_string(),
            task.title.as_str(),
            task.description.as_str(),
            task.is_checked,
            format_instant(&task.created_at),
            format_instant(&task.updated_at),
            task.expires_on.as_ref().map(format_offset),
        ],
    )?;
    Ok(changed)
}

fn select_task_by_id(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare_cached(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_task_row(row)?)),
        None => Ok(None),
    }
}

fn select_all_tasks(conn: &Connection) -> RepoResult<Vec<Task>> {
    let mut stmt = conn.prepare_cached(&format!("{TASK_SELECT_SQL} {TASK_ORDER_SQL};"))?;
    let mut rows = stmt.query([])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in Tasks.id"))
    })?;

    let is_checked = match row.get::<_, i64>("is_checked")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_checked value `{other}` in Tasks.is_checked"
            )));
        }
    };

    let expires_on = match row.get::<_, Option<String>>("expires_on")? {
        Some(text) => Some(parse_timestamp(&text, "expires_on")?),
        None => None,
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        is_checked,
        created_at: parse_timestamp(&row.get::<_, String>("created_at")?, "created_at")?,
        updated_at: parse_timestamp(&row.get::<_, String>("updated_at")?, "updated_at")?,
        expires_on,
    })
}

/// Formats an instant as fixed-width UTC text so that text order matches
/// time order (`MAX(updated_at, ?)` relies on it).
fn format_instant(value: &DateTime<FixedOffset>) -> String {
    value
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Formats an offset date-time keeping its original offset.
fn format_offset(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str, column: &str) -> RepoResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).map_err(|_| {
        RepoError::InvalidData(format!("invalid timestamp `{text}` in Tasks.{column}"))
    })
}
