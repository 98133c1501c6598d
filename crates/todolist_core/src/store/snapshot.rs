//! Snapshot values and live subscriptions over the list store.
//!
//! # Invariants
//! - `Snapshot::todos` is always sorted ascending by display order.
//! - `Snapshot::version` grows by one per publish; version 0 is the state
//!   loaded when the store opened.

use crate::model::todo::{Todo, TodoId};
use std::sync::Arc;
use tokio::sync::watch;

/// Full ordered materialization of the todo collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub todos: Arc<[Todo]>,
}

impl Snapshot {
    pub(crate) fn new(version: u64, todos: Vec<Todo>) -> Self {
        Self {
            version,
            todos: todos.into(),
        }
    }

    /// Empty snapshot at version 0.
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Looks up one todo by id.
    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<TodoId> {
        self.todos.iter().map(|todo| todo.id).collect()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Live query handle returned by `ListStore::get_all`.
///
/// The first [`Subscription::next`] call yields the current snapshot right
/// away; later calls wait for the next publish. Snapshots published while
/// nobody is waiting coalesce into the latest one. Dropping a subscription
/// never affects store state.
pub struct Subscription {
    receiver: watch::Receiver<Snapshot>,
    primed: bool,
}

impl Subscription {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        Self {
            receiver,
            primed: false,
        }
    }

    /// Returns the latest published snapshot without waiting.
    pub fn current(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Returns the latest snapshot and marks it seen, so the following
    /// [`Subscription::next`] waits for a newer publish.
    pub fn take_current(&mut self) -> Snapshot {
        self.primed = true;
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the store has shut down and no newer snapshot is
    /// pending.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if !self.primed {
            self.primed = true;
            return Some(self.receiver.borrow_and_update().clone());
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}
