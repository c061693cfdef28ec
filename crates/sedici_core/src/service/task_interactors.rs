//! Write interactors over the task repository.
//!
//! Each type wraps exactly one `TaskRepository` call and reports progress
//! through [`Interactor::invoke`].

use crate::model::task::{NewTask, TaskId};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use crate::service::interactor::Interactor;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;

/// Persists a new task.
#[derive(Clone)]
pub struct SaveNewTask {
    repo: Arc<dyn TaskRepository>,
}

impl SaveNewTask {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

impl Interactor for SaveNewTask {
    type Params = NewTask;
    const NAME: &'static str = "save_new_task";

    fn do_work(&self, params: NewTask) -> RepoResult<()> {
        let id = self.repo.save_new_task(&params)?;
        debug!("event=task_created module=service status=ok task_id={id}");
        Ok(())
    }
}

/// Deletes a task; absent ids are a no-op.
#[derive(Clone)]
pub struct DeleteTaskById {
    repo: Arc<dyn TaskRepository>,
}

impl DeleteTaskById {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

impl Interactor for DeleteTaskById {
    type Params = TaskId;
    const NAME: &'static str = "delete_task_by_id";

    fn do_work(&self, id: TaskId) -> RepoResult<()> {
        self.repo.delete_task_by_id(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTaskIsCheckedParams {
    pub id: TaskId,
    pub is_checked: bool,
}

#[derive(Clone)]
pub struct SetTaskIsCheckedById {
    repo: Arc<dyn TaskRepository>,
}

impl SetTaskIsCheckedById {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

impl Interactor for SetTaskIsCheckedById {
    type Params = SetTaskIsCheckedParams;
    const NAME: &'static str = "set_task_is_checked_by_id";

    fn do_work(&self, params: SetTaskIsCheckedParams) -> RepoResult<()> {
        self.repo.set_task_checked_by_id(params.id, params.is_checked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTaskTitleParams {
    pub id: TaskId,
    pub title: String,
}

#[derive(Clone)]
pub struct SetTaskTitleById {
    repo: Arc<dyn TaskRepository>,
}

impl SetTaskTitleById {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

impl Interactor for SetTaskTitleById {
    type Params = SetTaskTitleParams;
    const NAME: &'static str = "set_task_title_by_id";

    fn do_work(&self, params: SetTaskTitleParams) -> RepoResult<()> {
        self.repo.set_task_title_by_id(params.id, &params.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTaskDescriptionParams {
    pub id: TaskId,
    pub description: String,
}

#[derive(Clone)]
pub struct SetTaskDescriptionById {
    repo: Arc<dyn TaskRepository>,
}

impl SetTaskDescriptionById {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

impl Interactor for SetTaskDescriptionById {
    type Params = SetTaskDescriptionParams;
    const NAME: &'static str = "set_task_description_by_id";

    fn do_work(&self, params: SetTaskDescriptionParams) -> RepoResult<()> {
        self.repo.set_task_description_by_id(params.id, &params.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTaskExpirationDateParams {
    pub id: TaskId,
    /// `None` clears the expiration.
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct SetTaskExpirationDateById {
    repo: Arc<dyn TaskRepository>,
}

impl SetTaskExpirationDateById {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

impl Interactor for SetTaskExpirationDateById {
    type Params = SetTaskExpirationDateParams;
    const NAME: &'static str = "set_task_expiration_date_by_id";

    fn do_work(&self, params: SetTaskExpirationDateParams) -> RepoResult<()> {
        self.repo.set_task_expiration_by_id(params.id, params.expiration_date)
    }
}
