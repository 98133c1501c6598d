//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical todo record and its partial-update shapes.
//! - Provide title normalization used by the caller layer.
//!
//! # Invariants
//! - `id` is assigned once at insert and never reused for another todo.
//! - `created_at` is set once at insert and never changes.
//! - Persisted titles are never blank after trimming; the store itself does
//!   not trim, callers normalize through [`normalize_title`] first.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one todo record.
pub type TodoId = Uuid;

/// Ordinal assigned to the very first todo of an empty list.
pub const FIRST_ORDER: i64 = 1;

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Store-assigned identifier.
    pub id: TodoId,
    /// User-facing text.
    pub title: String,
    /// Completion flag. New todos start as `false`.
    pub completed: bool,
    /// Unix epoch milliseconds at insert time.
    pub created_at: i64,
    /// Display ordinal. Not required to be contiguous.
    pub order: i64,
}

impl Todo {
    /// Returns whether this todo still counts towards "items left".
    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Partial update applied by `update`.
///
/// Only fields set to `Some` are written; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Patch that only replaces the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    /// Patch that only sets the completion flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    /// Returns true when applying the patch would write nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// One `(id, order)` pair of a reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: TodoId,
    pub order: i64,
}

/// Title validation failures raised by the caller layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// Title is empty or whitespace-only.
    BlankTitle,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "todo title must not be blank"),
        }
    }
}

impl Error for TodoValidationError {}

/// Trims `raw` and rejects blank results.
///
/// # Errors
/// - Returns [`TodoValidationError::BlankTitle`] when nothing but whitespace
///   remains.
pub fn normalize_title(raw: &str) -> Result<String, TodoValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TodoValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Todo, TodoPatch, TodoValidationError};
    use uuid::Uuid;

    #[test]
    fn normalize_title_trims_surrounding_whitespace() {
        assert_eq!(normalize_title("  Buy milk \n").unwrap(), "Buy milk");
    }

    #[test]
    fn normalize_title_rejects_whitespace_only() {
        assert_eq!(
            normalize_title(" \t ").unwrap_err(),
            TodoValidationError::BlankTitle
        );
        assert_eq!(normalize_title("").unwrap_err(), TodoValidationError::BlankTitle);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TodoPatch::default().is_empty());
        assert!(!TodoPatch::completed(true).is_empty());
        assert!(!TodoPatch::title("x").is_empty());
    }

    #[test]
    fn todo_serializes_with_camel_case_keys() {
        let todo = Todo {
            id: Uuid::nil(),
            title: "Walk dog".to_string(),
            completed: false,
            created_at: 1_700_000_000_000,
            order: 2,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["order"], 2);
        assert_eq!(json["completed"], false);
    }
}
