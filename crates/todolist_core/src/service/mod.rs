//! Core use-case services.
//!
//! # Responsibility
//! - Apply caller-layer validation before delegating to the list store.
//! - Keep FFI/CLI layers decoupled from store internals.

pub mod todo_service;
