//! Domain model for the ordered todo list.
//!
//! # Responsibility
//! - Define canonical data structures used by store and reconciler.
//!
//! # Invariants
//! - Every todo is identified by a stable `TodoId` for its whole lifetime.
//! - Deletion is a hard delete; there is no tombstone or undo.

pub mod todo;
