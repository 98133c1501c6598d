//! Client reconciler: turns store snapshots into what the user sees.
//!
//! # Responsibility
//! - Filter by mode, apply the display policy, count open items.
//! - Translate drag results into `reorder` batches.
//!
//! # Invariants
//! - Nothing in this module writes to the store except `LiveList::commit_drag`.

pub mod filter;
pub mod live;
pub mod reconciler;
