//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the todo list operations to Dart via FRB as sync calls.
//! - Own the process-wide list store and the runtime that drives it.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through response envelopes, never by unwinding.
//! - The store is opened lazily from `CoreConfig::from_env` on first use; a
//!   failed open is retried by the next call.
//! - A store whose writer has stopped is replaced on the next call; the call
//!   that observed the closed store still fails.

use log::{info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use todolist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    logging_status as logging_status_inner, ping as ping_inner, CoreConfig, DisplayPolicy,
    FilterMode, ListStore, Reconciler, ServiceError, Todo, TodoId, TodoService,
};
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

static BRIDGE: Mutex<Option<Arc<Bridge>>> = Mutex::new(None);

struct Bridge {
    runtime: Runtime,
    service: TodoService,
    display_policy: DisplayPolicy,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Active logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatusResponse {
    /// Whether `init_logging` has succeeded in this process.
    pub active: bool,
    /// Active level, empty when inactive.
    pub level: String,
    /// Active log directory, empty when inactive.
    pub log_dir: String,
}

/// Reports whether core logging is running and where it writes.
///
/// # FFI contract
/// - Sync call, non-blocking. Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn logging_status() -> LoggingStatusResponse {
    match logging_status_inner() {
        Some((level, log_dir)) => LoggingStatusResponse {
            active: true,
            level: level.to_string(),
            log_dir: log_dir.display().to_string(),
        },
        None => LoggingStatusResponse {
            active: false,
            level: String::new(),
            log_dir: String::new(),
        },
    }
}

/// One row of the displayed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    /// Stable todo ID in string form.
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub order: i64,
    pub created_at_ms: i64,
}

/// Displayed list for one filter mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    /// Filtered items in display order.
    pub items: Vec<TodoItem>,
    /// Open items over the whole list, independent of the filter.
    pub active_count: u32,
    /// Snapshot version the items were derived from.
    pub version: u64,
    /// Applied filter (`all|active|completed`).
    pub filter: String,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected todo ID, when the action targets or creates one.
    pub todo_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TodoActionResponse {
    fn success(message: impl Into<String>, todo_id: Option<String>) -> Self {
        Self {
            ok: true,
            todo_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            todo_id: None,
            message: message.into(),
        }
    }
}

/// Returns the list filtered by `filter` (`None` means `all`).
///
/// # FFI contract
/// - Sync call; reads the latest published snapshot, no DB round trip.
/// - Unknown filter names fail with `ok=false` and an empty item list.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list(filter: Option<String>) -> TodoListResponse {
    let mode = match filter.as_deref().map(FilterMode::parse).transpose() {
        Ok(mode) => mode.unwrap_or_default(),
        Err(err) => return TodoListResponse::failure(format!("todo_list failed: {err}")),
    };
    let bridge = match bridge() {
        Ok(bridge) => bridge,
        Err(err) => return TodoListResponse::failure(format!("todo_list failed: {err}")),
    };

    let mut reconciler = Reconciler::new(bridge.display_policy);
    reconciler.apply_snapshot(bridge.service.snapshot());
    reconciler.set_filter(mode);

    let items = reconciler
        .visible()
        .into_iter()
        .map(to_todo_item)
        .collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No todos.".to_string()
    } else {
        format!("{} todo(s).", items.len())
    };
    TodoListResponse {
        ok: true,
        active_count: u32::try_from(reconciler.active_count()).unwrap_or(u32::MAX),
        version: reconciler.snapshot().version,
        filter: mode.as_str().to_string(),
        items,
        message,
    }
}

/// Creates a todo at the end of the list.
///
/// # FFI contract
/// - Blank titles (after trimming) are rejected.
/// - Returns the created todo ID on success. Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_create(title: String) -> TodoActionResponse {
    match run(|service| async move { service.create(&title).await }) {
        Ok(id) => TodoActionResponse::success("Todo created.", Some(id.to_string())),
        Err(err) => TodoActionResponse::failure(format!("todo_create failed: {err}")),
    }
}

/// Replaces the title of one todo.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_update_title(id: String, title: String) -> TodoActionResponse {
    let todo_id = match parse_todo_id(&id) {
        Ok(todo_id) => todo_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match run(|service| async move { service.rename(todo_id, &title).await }) {
        Ok(()) => TodoActionResponse::success("Todo updated.", Some(id)),
        Err(err) => TodoActionResponse::failure(format!("todo_update_title failed: {err}")),
    }
}

/// Flips the completed flag of one todo.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle(id: String) -> TodoActionResponse {
    let todo_id = match parse_todo_id(&id) {
        Ok(todo_id) => todo_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match run(|service| async move { service.toggle(todo_id).await }) {
        Ok(true) => TodoActionResponse::success("Todo completed.", Some(id)),
        Ok(false) => TodoActionResponse::success("Todo reopened.", Some(id)),
        Err(err) => TodoActionResponse::failure(format!("todo_toggle failed: {err}")),
    }
}

/// Deletes one todo. Deleting an unknown id succeeds without effect.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: String) -> TodoActionResponse {
    let todo_id = match parse_todo_id(&id) {
        Ok(todo_id) => todo_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match run(|service| async move { service.delete(todo_id).await }) {
        Ok(true) => TodoActionResponse::success("Todo deleted.", Some(id)),
        Ok(false) => TodoActionResponse::success("Todo already gone.", Some(id)),
        Err(err) => TodoActionResponse::failure(format!("todo_delete failed: {err}")),
    }
}

/// Persists a finished drag.
///
/// Input semantics:
/// - `ids`: the full visible sequence after the drag; item `i` gets order `i`.
///
/// # FFI contract
/// - Any malformed id rejects the whole batch before the store is touched.
/// - A missing id stops the batch; earlier items stay reordered.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_reorder(ids: Vec<String>) -> TodoActionResponse {
    let todo_ids = match ids
        .iter()
        .map(|id| parse_todo_id(id))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(todo_ids) => todo_ids,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match run(|service| async move { service.reorder_visible(&todo_ids).await }) {
        Ok(()) => TodoActionResponse::success(format!("Reordered {} todo(s).", ids.len()), None),
        Err(err) => TodoActionResponse::failure(format!("todo_reorder failed: {err}")),
    }
}

/// Removes every completed todo.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_clear_completed() -> TodoActionResponse {
    match run(|service| async move { service.clear_completed().await }) {
        Ok(removed) => {
            TodoActionResponse::success(format!("Removed {removed} completed todo(s)."), None)
        }
        Err(err) => TodoActionResponse::failure(format!("todo_clear_completed failed: {err}")),
    }
}

impl TodoListResponse {
    fn failure(message: String) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            active_count: 0,
            version: 0,
            filter: FilterMode::All.as_str().to_string(),
            message,
        }
    }
}

fn bridge() -> Result<Arc<Bridge>, String> {
    let mut slot = BRIDGE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(bridge) = slot.as_ref() {
        if !bridge.service.store().is_closed() {
            return Ok(Arc::clone(bridge));
        }
        warn!("event=ffi_store_reopen module=ffi status=start reason=store_closed");
    }
    let bridge = Arc::new(open_bridge()?);
    *slot = Some(Arc::clone(&bridge));
    Ok(bridge)
}

fn open_bridge() -> Result<Bridge, String> {
    let config = CoreConfig::from_env().map_err(|err| format!("invalid config: {err}"))?;
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("todolist-ffi")
        .build()
        .map_err(|err| format!("runtime start failed: {err}"))?;
    let store = ListStore::open(&config.db_path).map_err(|err| {
        warn!("event=ffi_store_open module=ffi status=error error={err}");
        format!("todo store open failed: {err}")
    })?;
    info!(
        "event=ffi_store_open module=ffi status=ok display_policy={}",
        config.display_policy.as_str()
    );
    Ok(Bridge {
        runtime,
        service: TodoService::new(store),
        display_policy: config.display_policy,
    })
}

fn run<T, F, Fut>(op: F) -> Result<T, String>
where
    F: FnOnce(TodoService) -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let bridge = bridge()?;
    let future = op(bridge.service.clone());
    bridge
        .runtime
        .block_on(future)
        .map_err(|err| err.to_string())
}

fn parse_todo_id(raw: &str) -> Result<TodoId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid todo id `{}`", raw.trim()))
}

fn to_todo_item(todo: Todo) -> TodoItem {
    TodoItem {
        id: todo.id.to_string(),
        title: todo.title,
        completed: todo.completed,
        order: todo.order,
        created_at_ms: todo.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        bridge, core_version, init_logging, logging_status, ping, todo_clear_completed,
        todo_create, todo_delete, todo_list, todo_reorder, todo_toggle, todo_update_title,
    };
    use std::sync::{Mutex, MutexGuard, Once};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_DB: Once = Once::new();
    static TEST_DB_LOCK: Mutex<()> = Mutex::new(());

    // Every test shares the process-wide store: tests hold the lock and only
    // look at todos they created themselves.
    fn use_test_db() -> MutexGuard<'static, ()> {
        TEST_DB.call_once(|| {
            let file_name = format!("{}.sqlite3", unique_token("todolist-ffi"));
            std::env::set_var("TODOLIST_DB_PATH", std::env::temp_dir().join(file_name));
        });
        TEST_DB_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn create(title: &str) -> String {
        let response = todo_create(title.to_string());
        assert!(response.ok, "{}", response.message);
        response.todo_id.expect("create should return todo_id")
    }

    fn position(ids: &[String], id: &str) -> usize {
        ids.iter()
            .position(|candidate| candidate == id)
            .expect("id should be listed")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn logging_status_reports_initialized_directory() {
        let log_dir = std::env::temp_dir().join(unique_token("todolist-ffi-logs"));
        let log_dir = log_dir.display().to_string();
        assert_eq!(init_logging("info".to_string(), log_dir.clone()), "");

        let status = logging_status();
        assert!(status.active);
        assert_eq!(status.level, "info");
        assert_eq!(status.log_dir, log_dir);
    }

    #[test]
    fn closed_store_is_reopened_on_next_call() {
        let _guard = use_test_db();
        let id = create(&unique_token("survivor"));

        let current = bridge().unwrap();
        current.runtime.block_on(current.service.store().shutdown());
        assert!(current.service.store().is_closed());
        drop(current);

        let list = todo_list(None);
        assert!(list.ok, "{}", list.message);
        assert!(list.items.iter().any(|item| item.id == id));
        create(&unique_token("after-reopen"));
    }

    #[test]
    fn create_then_list_and_toggle_moves_item_between_filters() {
        let _guard = use_test_db();
        let id = create(&unique_token("toggle"));

        let active = todo_list(Some("active".to_string()));
        assert!(active.ok, "{}", active.message);
        assert!(active.items.iter().any(|item| item.id == id));

        let toggled = todo_toggle(id.clone());
        assert!(toggled.ok, "{}", toggled.message);

        let active = todo_list(Some("active".to_string()));
        assert!(active.items.iter().all(|item| item.id != id));
        let completed = todo_list(Some("completed".to_string()));
        assert_eq!(completed.filter, "completed");
        assert!(completed.items.iter().any(|item| item.id == id && item.completed));
    }

    #[test]
    fn create_rejects_blank_title() {
        let _guard = use_test_db();
        let response = todo_create("   ".to_string());
        assert!(!response.ok);
        assert!(response.todo_id.is_none());
    }

    #[test]
    fn update_title_trims_input() {
        let _guard = use_test_db();
        let id = create(&unique_token("rename"));
        let renamed = unique_token("renamed");

        let response = todo_update_title(id.clone(), format!("  {renamed}  "));
        assert!(response.ok, "{}", response.message);

        let list = todo_list(None);
        let item = list.items.iter().find(|item| item.id == id).unwrap();
        assert_eq!(item.title, renamed);
    }

    #[test]
    fn reorder_places_items_in_given_sequence() {
        let _guard = use_test_db();
        let first = create(&unique_token("first"));
        let second = create(&unique_token("second"));

        let response = todo_reorder(vec![second.clone(), first.clone()]);
        assert!(response.ok, "{}", response.message);

        let ids = todo_list(None)
            .items
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert!(position(&ids, &second) < position(&ids, &first));
    }

    #[test]
    fn malformed_ids_and_filters_fail_without_panicking() {
        let _guard = use_test_db();
        assert!(!todo_toggle("not-a-uuid".to_string()).ok);
        assert!(!todo_reorder(vec!["nope".to_string()]).ok);

        let list = todo_list(Some("done".to_string()));
        assert!(!list.ok);
        assert!(list.items.is_empty());
    }

    #[test]
    fn unknown_ids_report_not_found_except_delete() {
        let _guard = use_test_db();
        let unknown = uuid::Uuid::new_v4().to_string();

        let toggled = todo_toggle(unknown.clone());
        assert!(!toggled.ok);
        assert!(toggled.message.contains("not found"));

        assert!(todo_delete(unknown).ok);
    }

    #[test]
    fn clear_completed_removes_completed_items() {
        let _guard = use_test_db();
        let id = create(&unique_token("clear"));
        assert!(todo_toggle(id.clone()).ok);

        let response = todo_clear_completed();
        assert!(response.ok, "{}", response.message);
        assert!(todo_list(None).items.iter().all(|item| item.id != id));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
