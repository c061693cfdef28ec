//! Domain model for tasks.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep storage and UI concerns out of the domain types.
//!
//! # Invariants
//! - Every task is identified by a stable, non-nil `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
