//! In-memory view state derived from store snapshots.
//!
//! # Responsibility
//! - Keep the latest snapshot, filter mode and display policy.
//! - Translate a finished drag gesture into a reorder batch.
//!
//! # Invariants
//! - Snapshots older than the held one are ignored.
//! - `reorder_updates` assigns dense ordinals `0..k-1` to exactly the ids it
//!   is given. Todos hidden by the current filter keep their ordinals, so
//!   dragging inside a filtered view can interleave them differently than
//!   before. This is a known limitation, not an accident.

use super::filter::{active_count, project, DisplayPolicy, FilterMode};
use crate::model::todo::{OrderUpdate, Todo, TodoId};
use crate::store::snapshot::Snapshot;

/// Derived list state for one client.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    snapshot: Snapshot,
    filter: FilterMode,
    policy: DisplayPolicy,
}

impl Reconciler {
    pub fn new(policy: DisplayPolicy) -> Self {
        Self {
            snapshot: Snapshot::empty(),
            filter: FilterMode::All,
            policy,
        }
    }

    /// Replaces the held snapshot when `snapshot` is not older.
    ///
    /// Returns whether the snapshot was taken.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.version < self.snapshot.version {
            return false;
        }
        self.snapshot = snapshot;
        true
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn policy(&self) -> DisplayPolicy {
        self.policy
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Todos visible under the current filter, in display order.
    pub fn visible(&self) -> Vec<Todo> {
        project(&self.snapshot.todos, self.filter, self.policy)
    }

    /// Open todos over the whole unfiltered snapshot.
    pub fn active_count(&self) -> usize {
        active_count(&self.snapshot.todos)
    }

    /// Builds the reorder batch for a finished drag.
    ///
    /// `dragged` is the full post-drag sequence of visible ids.
    pub fn reorder_updates(&self, dragged: &[TodoId]) -> Vec<OrderUpdate> {
        reorder_updates(dragged)
    }
}

/// Assigns `order = index` to each id in sequence.
pub fn reorder_updates(dragged: &[TodoId]) -> Vec<OrderUpdate> {
    dragged
        .iter()
        .zip(0_i64..)
        .map(|(id, order)| OrderUpdate { id: *id, order })
        .collect()
}
