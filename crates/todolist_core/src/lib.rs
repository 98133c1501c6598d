//! Core domain logic for the ordered todo list.
//! This crate is the single source of truth for list ordering and mutation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::todo::{
    normalize_title, OrderUpdate, Todo, TodoId, TodoPatch, TodoValidationError, FIRST_ORDER,
};
pub use reconcile::filter::{DisplayPolicy, FilterMode, ParseModeError};
pub use reconcile::live::LiveList;
pub use reconcile::reconciler::Reconciler;
pub use repo::todo_repo::{RepoError, RepoResult, SqliteTodoRepository, TodoRepository};
pub use service::todo_service::{ServiceError, ServiceResult, TodoService};
pub use store::list_store::{ListStore, StoreError, StoreResult};
pub use store::snapshot::{Snapshot, Subscription};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
