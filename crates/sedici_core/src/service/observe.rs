//! Observation interactors.
//!
//! # Responsibility
//! - Forward a repository live query into a `watch` channel owned by the
//!   interactor, so consumers keep one stable receiver across resubscribes.
//!
//! # Invariants
//! - The channel holds `None` until the first result arrives.
//! - Invoking again aborts the previous subscription; values produced by a
//!   superseded subscription are never published.
//! - Query failures are logged and the last good value is kept.

use crate::db::LiveQuery;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoError, TaskRepository};
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Latest-value subject fed by at most one live subscription at a time.
pub(crate) struct Subject<T> {
    name: &'static str,
    output: Arc<watch::Sender<Option<T>>>,
    generation: Arc<AtomicU64>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + Sync + 'static> Subject<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        let (output, _) = watch::channel(None);
        Self {
            name,
            output: Arc::new(output),
            generation: Arc::new(AtomicU64::new(0)),
            forwarder: Mutex::new(None),
        }
    }

    /// Replaces the current subscription with `query`.
    pub(crate) fn resubscribe(&self, mut query: LiveQuery<T, RepoError>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let output = Arc::clone(&self.output);
        let name = self.name;

        let forwarder = tokio::spawn(async move {
            while let Some(result) = query.next().await {
                match result {
                    Ok(value) => {
                        output.send_if_modified(|slot| {
                            if current.load(Ordering::SeqCst) != generation {
                                return false;
                            }
                            *slot = Some(value);
                            true
                        });
                    }
                    Err(err) => {
                        warn!(
                            "event=observe module=service status=error name={name} error={err}"
                        );
                    }
                }
            }
            debug!("event=observe module=service status=closed name={name}");
        });

        if let Some(previous) = self.forwarder.lock().replace(forwarder) {
            previous.abort();
        }
    }

    pub(crate) fn flow(&self) -> watch::Receiver<Option<T>> {
        self.output.subscribe()
    }
}

impl<T> Drop for Subject<T> {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.get_mut().take() {
            forwarder.abort();
        }
    }
}

/// Observes the full ordered task list.
pub struct ObserveTasks {
    repo: Arc<dyn TaskRepository>,
    subject: Subject<Vec<Task>>,
}

impl ObserveTasks {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self {
            repo,
            subject: Subject::new("observe_tasks"),
        }
    }

    /// Subscribes (or resubscribes) to the task list.
    pub fn invoke(&self) {
        self.subject.resubscribe(self.repo.observe_tasks());
    }

    pub fn flow(&self) -> watch::Receiver<Option<Vec<Task>>> {
        self.subject.flow()
    }
}

/// Observes one task; the inner `None` means the task does not exist.
pub struct ObserveTaskById {
    repo: Arc<dyn TaskRepository>,
    subject: Subject<Option<Task>>,
}

impl ObserveTaskById {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self {
            repo,
            subject: Subject::new("observe_task_by_id"),
        }
    }

    /// Subscribes to `id`, dropping any previous subscription.
    pub fn invoke(&self, id: TaskId) {
        self.subject.resubscribe(self.repo.observe_task_by_id(id));
    }

    pub fn flow(&self) -> watch::Receiver<Option<Option<Task>>> {
        self.subject.flow()
    }
}
