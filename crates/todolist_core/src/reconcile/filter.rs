//! Pure projections from a store snapshot to a displayed list.
//!
//! # Invariants
//! - Filtering and display ordering never mutate their input.
//! - `DisplayPolicy::StoreOrder` keeps ascending store order untouched.
//! - `DisplayPolicy::CompletedFirst` is a stable partition; relative order
//!   inside each group is preserved.

use crate::model::todo::Todo;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which subset of the list the user is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    /// Only todos with `completed == false`.
    Active,
    /// Only todos with `completed == true`.
    Completed,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 3] = [Self::All, Self::Active, Self::Completed];

    /// Parses `all|active|completed` (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse(value: &str) -> Result<Self, ParseModeError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(ParseModeError::UnknownFilter(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Returns whether `todo` is visible under this mode.
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// Secondary ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPolicy {
    /// Ascending store order, no secondary reordering.
    #[default]
    StoreOrder,
    /// Completed todos first, each group kept in store order.
    CompletedFirst,
}

impl DisplayPolicy {
    /// Parses `store_order|completed_first`.
    pub fn parse(value: &str) -> Result<Self, ParseModeError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "store_order" => Ok(Self::StoreOrder),
            "completed_first" => Ok(Self::CompletedFirst),
            other => Err(ParseModeError::UnknownDisplayPolicy(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StoreOrder => "store_order",
            Self::CompletedFirst => "completed_first",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseModeError {
    UnknownFilter(String),
    UnknownDisplayPolicy(String),
}

impl Display for ParseModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFilter(value) => write!(
                f,
                "unsupported filter `{value}`; expected all|active|completed"
            ),
            Self::UnknownDisplayPolicy(value) => write!(
                f,
                "unsupported display policy `{value}`; expected store_order|completed_first"
            ),
        }
    }
}

impl Error for ParseModeError {}

/// Filters `todos` by `mode` and orders the result by `policy`.
pub fn project(todos: &[Todo], mode: FilterMode, policy: DisplayPolicy) -> Vec<Todo> {
    let mut visible: Vec<Todo> = todos
        .iter()
        .filter(|todo| mode.matches(todo))
        .cloned()
        .collect();
    if policy == DisplayPolicy::CompletedFirst {
        // `sort_by_key` is stable.
        visible.sort_by_key(|todo| !todo.completed);
    }
    visible
}

/// Number of todos still open, counted over the unfiltered list.
pub fn active_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| todo.is_active()).count()
}

#[cfg(test)]
mod tests {
    use super::{active_count, project, DisplayPolicy, FilterMode, ParseModeError};
    use crate::model::todo::Todo;
    use uuid::Uuid;

    fn todo(title: &str, order: i64, completed: bool) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            completed,
            created_at: 0,
            order,
        }
    }

    fn titles(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|todo| todo.title.as_str()).collect()
    }

    #[test]
    fn filter_modes_select_matching_subsequence() {
        let list = vec![
            todo("a", 1, false),
            todo("b", 2, true),
            todo("c", 3, false),
        ];

        let all = project(&list, FilterMode::All, DisplayPolicy::StoreOrder);
        assert_eq!(titles(&all), ["a", "b", "c"]);

        let active = project(&list, FilterMode::Active, DisplayPolicy::StoreOrder);
        assert_eq!(titles(&active), ["a", "c"]);

        let completed = project(&list, FilterMode::Completed, DisplayPolicy::StoreOrder);
        assert_eq!(titles(&completed), ["b"]);
    }

    #[test]
    fn completed_first_is_a_stable_partition() {
        let list = vec![
            todo("a", 1, false),
            todo("b", 2, true),
            todo("c", 3, false),
            todo("d", 4, true),
        ];

        let view = project(&list, FilterMode::All, DisplayPolicy::CompletedFirst);
        assert_eq!(titles(&view), ["b", "d", "a", "c"]);
    }

    #[test]
    fn active_count_ignores_filter_and_counts_open_items() {
        let list = vec![todo("a", 1, false), todo("b", 2, true)];
        assert_eq!(active_count(&list), 1);
        assert_eq!(active_count(&[]), 0);
    }

    #[test]
    fn parse_accepts_known_names_and_rejects_others() {
        assert_eq!(FilterMode::parse(" Active ").unwrap(), FilterMode::Active);
        assert_eq!(
            DisplayPolicy::parse("completed_first").unwrap(),
            DisplayPolicy::CompletedFirst
        );
        assert_eq!(
            FilterMode::parse("done").unwrap_err(),
            ParseModeError::UnknownFilter("done".to_string())
        );
        for mode in FilterMode::ALL_MODES {
            assert_eq!(FilterMode::parse(mode.as_str()).unwrap(), mode);
        }
    }
}
