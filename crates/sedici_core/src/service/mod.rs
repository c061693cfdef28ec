//! Core use-case interactors.
//!
//! # Responsibility
//! - Wrap one repository call per interactor behind a status envelope.
//! - Expose live observation of tasks with resubscribe-on-invoke semantics.
//! - Keep view models decoupled from storage details.

pub mod interactor;
pub mod observe;
pub mod task_interactors;
