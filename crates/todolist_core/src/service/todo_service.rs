//! Todo use-case service.
//!
//! # Responsibility
//! - Be the caller layer in front of the list store: normalize titles and
//!   reject blank ones before any store call.
//! - Expose the remaining store operations unchanged.
//!
//! # Invariants
//! - A blank title never reaches `ListStore::create` or `ListStore::update`.
//! - `NotFound` from the store keeps its id.

use crate::model::todo::{normalize_title, OrderUpdate, TodoId, TodoPatch, TodoValidationError};
use crate::reconcile::reconciler::reorder_updates;
use crate::store::list_store::{ListStore, StoreError};
use crate::store::snapshot::{Snapshot, Subscription};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Title is blank after trimming.
    InvalidTitle(TodoValidationError),
    /// Target todo does not exist.
    TodoNotFound(TodoId),
    /// Store-level failure.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle(err) => write!(f, "{err}"),
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTitle(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::TodoNotFound(_) => None,
        }
    }
}

impl From<TodoValidationError> for ServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::InvalidTitle(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::TodoNotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case facade over one list store.
#[derive(Clone)]
pub struct TodoService {
    store: ListStore,
}

impl TodoService {
    pub fn new(store: ListStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ListStore {
        &self.store
    }

    /// Live ordered list.
    pub fn subscribe(&self) -> Subscription {
        self.store.get_all()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Creates a todo from raw user input.
    pub async fn create(&self, raw_title: &str) -> ServiceResult<TodoId> {
        let title = normalize_title(raw_title)?;
        Ok(self.store.create(title).await?)
    }

    /// Replaces the title of one todo from raw user input.
    pub async fn rename(&self, id: TodoId, raw_title: &str) -> ServiceResult<()> {
        let title = normalize_title(raw_title)?;
        Ok(self.store.update(id, TodoPatch::title(title)).await?)
    }

    /// Applies a partial update, normalizing the title when present.
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> ServiceResult<()> {
        let patch = TodoPatch {
            title: patch.title.as_deref().map(normalize_title).transpose()?,
            completed: patch.completed,
        };
        Ok(self.store.update(id, patch).await?)
    }

    pub async fn toggle(&self, id: TodoId) -> ServiceResult<bool> {
        Ok(self.store.toggle(id).await?)
    }

    /// Deletes one todo; a missing id yields `Ok(false)`.
    pub async fn delete(&self, id: TodoId) -> ServiceResult<bool> {
        Ok(self.store.delete(id).await?)
    }

    /// Applies explicit `(id, order)` pairs in sequence.
    pub async fn reorder(&self, updates: Vec<OrderUpdate>) -> ServiceResult<()> {
        Ok(self.store.reorder(updates).await?)
    }

    /// Persists a drag result: `visible` is the full post-drag sequence.
    pub async fn reorder_visible(&self, visible: &[TodoId]) -> ServiceResult<()> {
        Ok(self.store.reorder(reorder_updates(visible)).await?)
    }

    pub async fn clear_completed(&self) -> ServiceResult<usize> {
        Ok(self.store.clear_completed().await?)
    }
}
