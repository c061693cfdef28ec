//! State cells and snapshot composition.
//!
//! A screen keeps one [`StateCell`] per independent piece of local state.
//! [`combine`] watches any number of heterogeneous inputs and recomputes the
//! full snapshot from the latest value of each whenever one of them changes.

use futures::future::{select_all, BoxFuture};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Single-writer, multi-reader latest value.
pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Stores `value`; observers are only woken when it differs.
    pub fn set(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn observe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Change source that can take part in a composition.
pub trait Input: Send + 'static {
    /// Resolves on the next change; `false` once the source is gone.
    fn changed(&mut self) -> BoxFuture<'_, bool>;
}

impl<T: Send + Sync + 'static> Input for watch::Receiver<T> {
    fn changed(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move { watch::Receiver::changed(self).await.is_ok() })
    }
}

/// Aborts the wrapped task when dropped.
pub(crate) struct TaskGuard(JoinHandle<()>);

impl TaskGuard {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawns a composer that republishes `project()` whenever an input changes.
///
/// The first snapshot is computed synchronously. Equal consecutive snapshots
/// are not republished. The composer stops once every input has closed or
/// the returned guard is dropped.
pub(crate) fn combine<S, F>(
    mut inputs: Vec<Box<dyn Input>>,
    mut project: F,
) -> (watch::Receiver<S>, TaskGuard)
where
    S: PartialEq + Send + Sync + 'static,
    F: FnMut() -> S + Send + 'static,
{
    let (tx, rx) = watch::channel(project());

    let composer = tokio::spawn(async move {
        while !inputs.is_empty() {
            let (open, index, _) =
                select_all(inputs.iter_mut().map(|input| input.changed())).await;
            if !open {
                inputs.swap_remove(index);
                continue;
            }

            let next = project();
            tx.send_if_modified(|current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });
        }
    });

    (rx, TaskGuard::new(composer))
}

#[cfg(test)]
mod tests {
    use super::{combine, Input, StateCell};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn cell_set_only_notifies_on_change() {
        let cell = StateCell::new(false);
        let rx = cell.observe();

        cell.set(false);
        assert!(!rx.has_changed().unwrap());

        cell.set(true);
        assert!(rx.has_changed().unwrap());
        assert!(cell.get());
    }

    #[tokio::test]
    async fn composed_snapshot_tracks_latest_of_every_input() {
        let left = Arc::new(StateCell::new(1));
        let right = Arc::new(StateCell::new(String::from("a")));

        let inputs: Vec<Box<dyn Input>> = vec![Box::new(left.observe()), Box::new(right.observe())];
        let (l, r) = (Arc::clone(&left), Arc::clone(&right));
        let (mut snapshots, _guard) = combine(inputs, move || (l.get(), r.get()));
        assert_eq!(*snapshots.borrow(), (1, String::from("a")));

        left.set(2);
        right.set(String::from("b"));

        let latest = tokio::time::timeout(
            Duration::from_secs(1),
            snapshots.wait_for(|snapshot| *snapshot == (2, String::from("b"))),
        )
        .await
        .expect("composer should catch up")
        .expect("composer should be running")
        .clone();
        assert_eq!(latest, (2, String::from("b")));
    }

    #[tokio::test]
    async fn dropping_guard_stops_composition() {
        let cell = Arc::new(StateCell::new(0));
        let reader = Arc::clone(&cell);
        let inputs: Vec<Box<dyn Input>> = vec![Box::new(cell.observe())];
        let (mut snapshots, guard) = combine(inputs, move || reader.get());

        drop(guard);
        tokio::task::yield_now().await;
        cell.set(5);

        let changed = tokio::time::timeout(Duration::from_millis(100), snapshots.changed()).await;
        match changed {
            Ok(result) => assert!(result.is_err(), "composer must not publish after abort"),
            Err(_) => {}
        }
        assert_eq!(*snapshots.borrow(), 0);
    }
}
