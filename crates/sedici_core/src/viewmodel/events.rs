//! One-shot navigation and error events.
//!
//! Events go out on a broadcast channel separate from UI-state. Emitting
//! never waits: with no subscriber the event is dropped, and subscribers
//! only receive events emitted after they subscribed. Navigation and
//! snackbar signals are only meaningful to whoever is on screen right now.

use crate::model::task::TaskId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Per-subscriber backlog before a slow subscriber starts lagging.
const EVENT_CAPACITY: usize = 16;

/// Where the presentation layer should navigate next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiDestination {
    Up,
    CreateTask,
    TaskDetails(TaskId),
    Stats,
}

/// Transient error to show to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnackbarError {
    ErrorWhileSaving,
    ErrorWhileDeleting,
    UnknownError,
}

impl SnackbarError {
    pub fn message(self) -> &'static str {
        match self {
            Self::ErrorWhileSaving => "Something went wrong while saving the task.",
            Self::ErrorWhileDeleting => "Something went wrong while deleting the task.",
            Self::UnknownError => "Something went wrong.",
        }
    }
}

/// Broadcast emitter with drop-if-nobody-listens semantics.
pub struct OneShotEvents<E> {
    tx: broadcast::Sender<E>,
    dropped: Arc<AtomicU64>,
}

impl<E> Clone for OneShotEvents<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<E: Clone + Send + 'static> OneShotEvents<E> {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emits to current subscribers. Returns how many received it.
    pub fn emit(&self, event: E) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }

    /// Receives events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Number of events emitted while nobody was subscribed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<E: Clone + Send + 'static> Default for OneShotEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}
