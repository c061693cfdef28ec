//! Core of SediciTasks: task persistence, write interactors and the
//! per-screen view models that turn both into observable UI-state.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod viewmodel;

pub use app::AppContainer;
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, Database, DbError, DbResult, LiveQuery};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{NewTask, Task, TaskId, TaskValidationError};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::interactor::{Interactor, InvokeError, InvokeStatus, InvokeStatusStream};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
