//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the keyed record store the list store runs on: ordered scan,
//!   point lookup, insert with generated id, partial patch and delete.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Ordered reads are `sort_order ASC, created_at ASC, id ASC`.
//! - `insert` computes `max(sort_order) + 1` (or `FIRST_ORDER` when empty)
//!   inside the same immediate transaction as the insert. A maximum of
//!   `i64::MAX` fails with `OrderExhausted` instead of wrapping.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::todo::{Todo, TodoId, TodoPatch, FIRST_ORDER};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    completed,
    created_at,
    sort_order
FROM todos";

const TODO_ORDER_BY_SQL: &str = "ORDER BY sort_order ASC, created_at ASC, id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    /// The largest stored ordinal is `i64::MAX`; nothing can be appended.
    OrderExhausted,
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::OrderExhausted => write!(
                f,
                "cannot append todo: sort_order already at {}",
                i64::MAX
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "todo repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record-store contract consumed by the list store.
pub trait TodoRepository {
    /// Returns every todo in ascending display order.
    fn list_by_order(&self) -> RepoResult<Vec<Todo>>;
    /// Loads one todo by id.
    fn get(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    /// Inserts a new todo at the end of the list and returns it.
    fn insert(&self, title: &str) -> RepoResult<Todo>;
    /// Applies the fields present in `patch`.
    fn patch(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<()>;
    /// Overwrites the ordinal of one todo.
    fn set_order(&self, id: TodoId, order: i64) -> RepoResult<()>;
    /// Deletes one todo. Returns `false` when no row matched.
    fn delete(&self, id: TodoId) -> RepoResult<bool>;
    /// Ordinal the next inserted todo would receive.
    fn next_order(&self) -> RepoResult<i64>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Creates repository from a migrated connection.
    ///
    /// # Errors
    /// - Returns [`RepoError::UninitializedConnection`] when the schema
    ///   version differs from [`latest_version`].
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn list_by_order(&self) -> RepoResult<Vec<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} {TODO_ORDER_BY_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }

    fn get(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }
        Ok(None)
    }

    fn insert(&self, title: &str) -> RepoResult<Todo> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let order = next_order(&tx)?;
        let todo = Todo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            completed: false,
            created_at: now_epoch_ms(),
            order,
        };

        tx.execute(
            "INSERT INTO todos (
                id,
                title,
                completed,
                created_at,
                sort_order,
                updated_at
            ) VALUES (?1, ?2, 0, ?3, ?4, ?3);",
            params![
                todo.id.to_string(),
                todo.title.as_str(),
                todo.created_at,
                todo.order,
            ],
        )?;
        tx.commit()?;

        Ok(todo)
    }

    fn patch(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<()> {
        if patch.is_empty() {
            return if todo_exists(self.conn, id)? {
                Ok(())
            } else {
                Err(RepoError::NotFound(id))
            };
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(completed) = patch.completed {
            assignments.push("completed = ?");
            bind_values.push(Value::Integer(bool_to_int(completed)));
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(now_epoch_ms()));
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!("UPDATE todos SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_order(&self, id: TodoId, order: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todos
             SET sort_order = ?2,
                 updated_at = ?3
             WHERE id = ?1;",
            params![id.to_string(), order, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete(&self, id: TodoId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn next_order(&self) -> RepoResult<i64> {
        next_order(self.conn)
    }
}

fn next_order(conn: &Connection) -> RepoResult<i64> {
    let max_order: Option<i64> =
        conn.query_row("SELECT MAX(sort_order) FROM todos;", [], |row| row.get(0))?;
    match max_order {
        None => Ok(FIRST_ORDER),
        Some(max) => max.checked_add(1).ok_or(RepoError::OrderExhausted),
    }
}

fn todo_exists(conn: &Connection, id: TodoId) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM todos WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in todos.id")))?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in todos.completed"
            )));
        }
    };

    Ok(Todo {
        id,
        title: row.get("title")?,
        completed,
        created_at: row.get("created_at")?,
        order: row.get("sort_order")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
