#![allow(dead_code)]

use parking_lot::Mutex;
use sedici_core::{
    Database, LiveQuery, NewTask, RepoError, RepoResult, SqliteTaskRepository, Task, TaskId,
    TaskRepository,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(2);

/// SQLite repository whose writes can be made to fail or to wait for a
/// release signal. Reads and live queries always go to the real store.
pub struct TestRepository {
    inner: SqliteTaskRepository,
    fail_writes: AtomicBool,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl TestRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(false, None))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::build(true, None))
    }

    /// Each write blocks until one `()` is sent on the returned sender.
    pub fn gated() -> (Arc<Self>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self::build(false, Some(rx))), tx)
    }

    fn build(fail_writes: bool, gate: Option<mpsc::Receiver<()>>) -> Self {
        Self {
            inner: SqliteTaskRepository::new(Database::open_in_memory().unwrap()),
            fail_writes: AtomicBool::new(fail_writes),
            gate: Mutex::new(gate),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Direct access that bypasses failure injection and gating.
    pub fn store(&self) -> &SqliteTaskRepository {
        &self.inner
    }

    fn before_write(&self) -> RepoResult<()> {
        if let Some(gate) = self.gate.lock().as_ref() {
            let _ = gate.recv();
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::InvalidData("injected failure".to_string()));
        }
        Ok(())
    }
}

impl TaskRepository for TestRepository {
    fn save_new_task(&self, new_task: &NewTask) -> RepoResult<TaskId> {
        self.before_write()?;
        self.inner.save_new_task(new_task)
    }

    fn insert_task(&self, task: &Task) -> RepoResult<()> {
        self.before_write()?;
        self.inner.insert_task(task)
    }

    fn insert_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        self.before_write()?;
        self.inner.insert_tasks(tasks)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        self.before_write()?;
        self.inner.update_task(task)
    }

    fn delete_task_by_id(&self, id: TaskId) -> RepoResult<()> {
        self.before_write()?;
        self.inner.delete_task_by_id(id)
    }

    fn set_task_checked_by_id(&self, id: TaskId, is_checked: bool) -> RepoResult<()> {
        self.before_write()?;
        self.inner.set_task_checked_by_id(id, is_checked)
    }

    fn set_task_title_by_id(&self, id: TaskId, title: &str) -> RepoResult<()> {
        self.before_write()?;
        self.inner.set_task_title_by_id(id, title)
    }

    fn set_task_description_by_id(&self, id: TaskId, description: &str) -> RepoResult<()> {
        self.before_write()?;
        self.inner.set_task_description_by_id(id, description)
    }

    fn set_task_expiration_by_id(
        &self,
        id: TaskId,
        expires_on: Option<chrono::NaiveDate>,
    ) -> RepoResult<()> {
        self.before_write()?;
        self.inner.set_task_expiration_by_id(id, expires_on)
    }

    fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.inner.get_task_by_id(id)
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.inner.list_tasks()
    }

    fn observe_tasks(&self) -> LiveQuery<Vec<Task>, RepoError> {
        self.inner.observe_tasks()
    }

    fn observe_task_by_id(&self, id: TaskId) -> LiveQuery<Option<Task>, RepoError> {
        self.inner.observe_task_by_id(id)
    }
}

/// Stores a task directly and returns it as persisted.
pub fn seed(repo: &TestRepository, title: &str) -> Task {
    let id = repo.store().save_new_task(&NewTask::new(title, "")).unwrap();
    repo.store().get_task_by_id(id).unwrap().unwrap()
}
