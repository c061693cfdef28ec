//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from interactors and view models.
//!
//! # Invariants
//! - Repository writes must enforce `Task::validate()` before persistence.
//! - Not-found conditions on writes are no-ops, never errors.

pub mod task_repo;
