//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted `Task` record and the `NewTask` creation input.
//! - Convert calendar expiration dates into offset date-times.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `updated_at` is never earlier than `created_at`.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a task.
pub type TaskId = Uuid;

/// Validation failures for task records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// The nil UUID is reserved and cannot identify a task.
    NilId,
    /// `updated_at` precedes `created_at`.
    UpdatedBeforeCreated,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be the nil uuid"),
            Self::UpdatedBeforeCreated => write!(f, "updated_at must not precede created_at"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub is_checked: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    /// Start of the expiration day, in the zone that was local when it was set.
    pub expires_on: Option<DateTime<FixedOffset>>,
}

impl Task {
    /// Creates an unchecked task with a generated id, stamped with `now`.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_offset();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            is_checked: false,
            created_at: now,
            updated_at: now,
            expires_on: None,
        }
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.updated_at < self.created_at {
            return Err(TaskValidationError::UpdatedBeforeCreated);
        }
        Ok(())
    }

    /// Returns whether the task is past its expiration at `now`.
    ///
    /// Checked tasks never count as expired.
    pub fn is_expired_at(&self, now: DateTime<FixedOffset>) -> bool {
        !self.is_checked && self.expires_on.is_some_and(|expires_on| expires_on < now)
    }
}

/// Input for creating a task. Has no identity yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub expires_on: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            expires_on: None,
        }
    }

    pub fn with_expiration(mut self, expires_on: Option<NaiveDate>) -> Self {
        self.expires_on = expires_on;
        self
    }

    /// Materializes the record that `save_new_task` persists.
    pub fn into_task(self, now: DateTime<FixedOffset>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            is_checked: false,
            created_at: now,
            updated_at: now,
            expires_on: self.expires_on.map(start_of_local_day),
        }
    }
}

/// Current instant as a UTC offset date-time, truncated to the microsecond
/// precision the store keeps.
pub(crate) fn now_offset() -> DateTime<FixedOffset> {
    Utc::now().trunc_subsecs(6).fixed_offset()
}

/// Start of `date` in the local time zone.
///
/// Falls back to UTC midnight when local midnight does not exist (DST gap).
pub fn start_of_local_day(date: NaiveDate) -> DateTime<FixedOffset> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.fixed_offset(),
        None => Utc.from_utc_datetime(&midnight).fixed_offset(),
    }
}
