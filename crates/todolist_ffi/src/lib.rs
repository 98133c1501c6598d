//! Flutter-facing bridge over `todolist_core`.

pub mod api;
