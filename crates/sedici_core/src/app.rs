//! Composition root.
//!
//! Wires one shared database into the repository and hands the repository to
//! every view model it creates.

use crate::config::AppConfig;
use crate::db::{Database, DbResult};
use crate::model::task::TaskId;
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::viewmodel::create_task::CreateTaskViewModel;
use crate::viewmodel::stats::StatsViewModel;
use crate::viewmodel::task_details::TaskDetailsViewModel;
use crate::viewmodel::tasks::TasksViewModel;
use std::sync::Arc;

/// Owns the shared repository. Cheap to clone.
#[derive(Clone)]
pub struct AppContainer {
    repo: Arc<dyn TaskRepository>,
}

impl AppContainer {
    /// Opens the database at `config.db_path`.
    pub fn open(config: &AppConfig) -> DbResult<Self> {
        Ok(Self::with_database(Database::open(&config.db_path)?))
    }

    /// Backed by a fresh in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    pub fn with_database(db: Database) -> Self {
        Self::with_repository(Arc::new(SqliteTaskRepository::new(db)))
    }

    /// Uses `repo` as is; tests inject doubles here.
    pub fn with_repository(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> Arc<dyn TaskRepository> {
        Arc::clone(&self.repo)
    }

    /// The view model constructors spawn tasks; call these within a Tokio runtime.
    pub fn tasks_view_model(&self) -> TasksViewModel {
        TasksViewModel::new(self.repository())
    }

    pub fn create_task_view_model(&self) -> CreateTaskViewModel {
        CreateTaskViewModel::new(self.repository())
    }

    pub fn task_details_view_model(&self, task_id: TaskId) -> TaskDetailsViewModel {
        TaskDetailsViewModel::new(self.repository(), task_id)
    }

    pub fn stats_view_model(&self) -> StatsViewModel {
        StatsViewModel::new(self.repository())
    }
}
