//! Per-screen view-state aggregators.
//!
//! # Responsibility
//! - Compose screen-local state cells and live domain data into immutable
//!   UI-state snapshots.
//! - Serialize user intents through one ordered queue per screen.
//! - Deliver navigation and transient errors as one-shot events.
//!
//! # Invariants
//! - Snapshots are recomputed from the latest value of every input; partial
//!   updates are never visible.
//! - Actions are handled one at a time, in submission order.
//! - The loading flag is true iff at least one launched call is unresolved.
//! - Dropping a view model stops its queue, composer and subscriptions.
//!   Interactor calls already in flight finish and their outcome is dropped.

pub mod action;
pub mod combine;
pub mod create_task;
pub mod events;
pub mod loading;
pub mod stats;
pub mod task_details;
pub mod tasks;

pub use action::{ActionQueue, UiActionHandler};
pub use combine::StateCell;
pub use events::{OneShotEvents, SnackbarError, UiDestination};
pub use loading::LoadingCounter;
