//! Ordered intent queue and interactor status translation.
//!
//! # Invariants
//! - One handler task per queue; the next action starts only after the
//!   previous `handle_ui_action` returned.
//! - Work launched by a handler reports back through [`watch_status`]; it
//!   never blocks the queue.
//! - A loader added for `Started` is always released, on success, on error,
//!   and when the status stream ends early.

use super::combine::TaskGuard;
use super::events::{OneShotEvents, SnackbarError};
use super::loading::LoadingCounter;
use crate::service::interactor::{InvokeStatus, InvokeStatusStream};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Screen-specific intent handler.
#[async_trait]
pub trait UiActionHandler<A>: Send + Sync + 'static {
    async fn handle_ui_action(&self, action: A);
}

/// Unbounded, strictly ordered intent queue drained by one task.
pub struct ActionQueue<A> {
    screen: &'static str,
    tx: mpsc::UnboundedSender<A>,
    _worker: TaskGuard,
}

impl<A: Send + 'static> ActionQueue<A> {
    /// Spawns the handler task for `screen`.
    pub fn spawn<H: UiActionHandler<A>>(screen: &'static str, handler: Arc<H>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<A>();
        let worker = tokio::spawn(async move {
            while let Some(action) = rx.recv().await {
                handler.handle_ui_action(action).await;
            }
            debug!("event=action_queue module=viewmodel status=closed screen={screen}");
        });

        Self {
            screen,
            tx,
            _worker: TaskGuard::new(worker),
        }
    }

    /// Fire-and-forget submission.
    pub fn submit(&self, action: A) {
        if self.tx.send(action).is_err() {
            warn!(
                "event=action_submit module=viewmodel status=error screen={} error_code=queue_closed",
                self.screen
            );
        }
    }
}

/// Follow-up run once an interactor reports success.
pub(crate) type OnSuccess = Box<dyn FnOnce() + Send>;

/// Consumes an interactor status stream on its own task.
///
/// `Started` adds a loader, `Success` releases it and runs `on_success`,
/// `Error` releases it and emits `on_error`.
pub(crate) fn watch_status(
    mut statuses: InvokeStatusStream,
    loading: LoadingCounter,
    snackbar_errors: OneShotEvents<SnackbarError>,
    on_error: SnackbarError,
    on_success: Option<OnSuccess>,
) {
    tokio::spawn(async move {
        let mut outstanding = false;
        let mut on_success = on_success;

        while let Some(status) = statuses.next().await {
            match status {
                InvokeStatus::Started => {
                    loading.add_loader();
                    outstanding = true;
                }
                InvokeStatus::Success => {
                    if std::mem::take(&mut outstanding) {
                        loading.remove_loader();
                    }
                    if let Some(follow_up) = on_success.take() {
                        follow_up();
                    }
                }
                InvokeStatus::Error(err) => {
                    if std::mem::take(&mut outstanding) {
                        loading.remove_loader();
                    }
                    warn!(
                        "event=ui_status module=viewmodel status=error snackbar={on_error:?} error={err}"
                    );
                    snackbar_errors.emit(on_error);
                }
            }
        }

        if outstanding {
            loading.remove_loader();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::{watch_status, ActionQueue, UiActionHandler};
    use crate::repo::task_repo::RepoError;
    use crate::service::interactor::{InvokeStatus, InvokeStatusStream};
    use crate::viewmodel::{LoadingCounter, OneShotEvents, SnackbarError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Recorder {
        seen: Mutex<Vec<u32>>,
        done: mpsc::UnboundedSender<()>,
    }

    #[async_trait]
    impl UiActionHandler<u32> for Recorder {
        async fn handle_ui_action(&self, action: u32) {
            // Later actions sleep less; ordering must still hold.
            tokio::time::sleep(Duration::from_millis(u64::from(10 - action))).await;
            self.seen.lock().push(action);
            let _ = self.done.send(());
        }
    }

    #[tokio::test]
    async fn actions_are_handled_in_submission_order() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            done: done_tx,
        });
        let queue = ActionQueue::spawn("test", Arc::clone(&recorder));

        for action in 0..5 {
            queue.submit(action);
        }
        for _ in 0..5 {
            done_rx.recv().await.unwrap();
        }

        assert_eq!(*recorder.seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    fn scripted(statuses: Vec<InvokeStatus>) -> InvokeStatusStream {
        let (tx, rx) = mpsc::unbounded_channel();
        for status in statuses {
            tx.send(status).unwrap();
        }
        InvokeStatusStream::from_receiver(rx)
    }

    #[tokio::test]
    async fn error_releases_loader_and_emits_snackbar() {
        let loading = LoadingCounter::new();
        let errors = OneShotEvents::new();
        let mut error_rx = errors.subscribe();

        watch_status(
            scripted(vec![
                InvokeStatus::Started,
                InvokeStatus::Error(RepoError::InvalidData("stub".to_string()).into()),
            ]),
            loading.clone(),
            errors.clone(),
            SnackbarError::ErrorWhileDeleting,
            None,
        );

        assert_eq!(
            error_rx.recv().await.unwrap(),
            SnackbarError::ErrorWhileDeleting
        );
        assert!(!loading.is_loading());
    }

    #[tokio::test]
    async fn stream_ending_after_started_still_releases_loader() {
        let loading = LoadingCounter::new();
        let mut observed = loading.observe();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(InvokeStatus::Started).unwrap();

        watch_status(
            InvokeStatusStream::from_receiver(rx),
            loading.clone(),
            OneShotEvents::new(),
            SnackbarError::UnknownError,
            None,
        );

        tokio::time::timeout(Duration::from_secs(1), observed.wait_for(|count| *count == 1))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(loading.is_loading());

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), observed.wait_for(|count| *count == 0))
            .await
            .unwrap()
            .unwrap();
        assert!(!loading.is_loading());
    }
}
