//! Status-reporting interactor contract.
//!
//! # Responsibility
//! - Run one repository call on the blocking pool per invocation.
//! - Report `Started`, then exactly one of `Success` / `Error`, then complete.
//!
//! # Invariants
//! - `Started` is queued before the work is scheduled.
//! - Failures (including panics in the work) are forwarded, never swallowed.
//! - Invocations are independent; nothing is coalesced or retried.

use crate::repo::task_repo::{RepoError, RepoResult};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use tokio::sync::mpsc;

/// Failure reported by an interactor invocation.
#[derive(Debug)]
pub enum InvokeError {
    /// The repository call failed.
    Repo(RepoError),
    /// The blocking worker panicked or was cancelled.
    Aborted(String),
}

impl Display for InvokeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Aborted(details) => write!(f, "interactor aborted: {details}"),
        }
    }
}

impl Error for InvokeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Aborted(_) => None,
        }
    }
}

impl From<RepoError> for InvokeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Three-state status envelope.
#[derive(Debug)]
pub enum InvokeStatus {
    Started,
    Success,
    Error(InvokeError),
}

impl InvokeStatus {
    /// Returns whether no further status follows this one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }
}

/// Status stream of one invocation. Ends after the terminal status.
pub struct InvokeStatusStream {
    rx: mpsc::UnboundedReceiver<InvokeStatus>,
}

impl InvokeStatusStream {
    #[cfg(test)]
    pub(crate) fn from_receiver(rx: mpsc::UnboundedReceiver<InvokeStatus>) -> Self {
        Self { rx }
    }

    /// Waits for the next status; `None` once the invocation has completed.
    pub async fn next(&mut self) -> Option<InvokeStatus> {
        self.rx.recv().await
    }

    /// Drains the stream and returns every status in order.
    pub async fn collect(mut self) -> Vec<InvokeStatus> {
        let mut statuses = Vec::new();
        while let Some(status) = self.next().await {
            statuses.push(status);
        }
        statuses
    }
}

/// Single-purpose use case wrapping one repository write.
pub trait Interactor: Clone + Send + Sync + 'static {
    type Params: Send + 'static;

    /// Stable name used in log events.
    const NAME: &'static str;

    /// Performs the blocking work.
    fn do_work(&self, params: Self::Params) -> RepoResult<()>;

    /// Launches the work and returns its status stream.
    ///
    /// Must be called from within a Tokio runtime.
    fn invoke(&self, params: Self::Params) -> InvokeStatusStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(InvokeStatus::Started);

        let interactor = self.clone();
        tokio::spawn(async move {
            let started_at = Instant::now();
            debug!(
                "event=interactor_invoke module=service status=start name={}",
                Self::NAME
            );

            let status = match tokio::task::spawn_blocking(move || interactor.do_work(params))
                .await
            {
                Ok(Ok(())) => {
                    debug!(
                        "event=interactor_invoke module=service status=ok name={} duration_ms={}",
                        Self::NAME,
                        started_at.elapsed().as_millis()
                    );
                    InvokeStatus::Success
                }
                Ok(Err(err)) => {
                    error!(
                        "event=interactor_invoke module=service status=error name={} duration_ms={} error_code=repo_failed error={}",
                        Self::NAME,
                        started_at.elapsed().as_millis(),
                        err
                    );
                    InvokeStatus::Error(InvokeError::Repo(err))
                }
                Err(join_err) => {
                    error!(
                        "event=interactor_invoke module=service status=error name={} duration_ms={} error_code=worker_aborted",
                        Self::NAME,
                        started_at.elapsed().as_millis()
                    );
                    InvokeStatus::Error(InvokeError::Aborted(join_err.to_string()))
                }
            };

            // The caller may have stopped listening; the result is discarded then.
            let _ = tx.send(status);
        });

        InvokeStatusStream { rx }
    }
}
