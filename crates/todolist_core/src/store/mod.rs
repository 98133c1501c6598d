//! List store: durable owner of the todo collection and its order index.
//!
//! # Responsibility
//! - Serialize all mutations through one writer thread over SQLite.
//! - Push a fresh ordered snapshot to every subscriber after each change.
//!
//! # Consistency model
//! - Each single-record operation is atomic.
//! - `reorder` batches and `clear_completed` scans are not atomic as a
//!   whole; another process writing the same database between two patches
//!   can interleave with them. No cross-record locking is attempted.

pub mod list_store;
pub mod snapshot;
mod writer;
