//! List store handle: the mutation and live-query surface of the core.
//!
//! # Responsibility
//! - Expose `get_all`, `create`, `update`, `toggle`, `delete`, `reorder`
//!   and `clear_completed` as async request/response operations.
//! - Route every mutation through one writer thread (see `writer`).
//!
//! # Invariants
//! - A mutation is acknowledged only after it is persisted and, when state
//!   changed, after the resulting snapshot is published.
//! - `reorder` and `clear_completed` are applied record by record and are
//!   not atomic as a whole; a failure mid-batch keeps earlier writes.
//! - Acknowledged mutations cannot be cancelled; dropping the returned future
//!   before the ack does not stop a command already queued.

use super::snapshot::{Snapshot, Subscription};
use super::writer::{self, Command};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::todo::{OrderUpdate, TodoId, TodoPatch};
use crate::repo::todo_repo::{RepoError, SqliteTodoRepository, TodoRepository};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tokio::sync::{mpsc, oneshot, watch};

/// Capacity of the internal mutation queue.
pub const MUTATION_QUEUE_CAPACITY: usize = 64;

const WRITER_THREAD_NAME: &str = "todolist-writer";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by list store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Operation references an id with no todo behind it.
    NotFound(TodoId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Writer thread could not be started.
    Spawn(std::io::Error),
    /// Store has shut down; the command was not applied.
    Closed,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start list store writer: {err}"),
            Self::Closed => write!(f, "list store is closed"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Spawn(err) => Some(err),
            Self::NotFound(_) | Self::Closed => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Cloneable handle to a running list store.
///
/// All clones share the same writer thread and snapshot channel.
#[derive(Clone)]
pub struct ListStore {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl ListStore {
    /// Opens (or creates) a database file and starts the writer thread.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::start(open_db(path)?)
    }

    /// Starts a store over a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::start(open_db_in_memory()?)
    }

    /// Starts a store over an already migrated connection.
    ///
    /// The connection moves into the writer thread; nothing else may use it
    /// afterwards.
    pub fn start(conn: Connection) -> StoreResult<Self> {
        let initial = {
            let repo = SqliteTodoRepository::try_new(&conn)?;
            Snapshot::new(0, repo.list_by_order()?)
        };

        let (command_tx, command_rx) = mpsc::channel(MUTATION_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        std::thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || writer::run(conn, command_rx, snapshot_tx))
            .map_err(StoreError::Spawn)?;

        Ok(Self {
            commands: command_tx,
            snapshots: snapshot_rx,
        })
    }

    /// Subscribes to the live, ordered todo list.
    pub fn get_all(&self) -> Subscription {
        Subscription::new(self.snapshots.clone())
    }

    /// Returns the latest published snapshot without subscribing.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Appends a todo with `order = max + 1` (or 1 on an empty list).
    ///
    /// The title is stored as given; trimming belongs to the caller layer.
    pub async fn create(&self, title: impl Into<String>) -> StoreResult<TodoId> {
        let title = title.into();
        self.request(|reply| Command::Create { title, reply }).await
    }

    /// Applies only the fields present in `patch`.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] when `id` does not exist.
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> StoreResult<()> {
        self.request(|reply| Command::Update { id, patch, reply }).await
    }

    /// Flips `completed` and returns the new value.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] when `id` does not exist.
    pub async fn toggle(&self, id: TodoId) -> StoreResult<bool> {
        self.request(|reply| Command::Toggle { id, reply }).await
    }

    /// Deletes one todo.
    ///
    /// A missing id is a soft no-op and returns `Ok(false)`.
    pub async fn delete(&self, id: TodoId) -> StoreResult<bool> {
        self.request(|reply| Command::Delete { id, reply }).await
    }

    /// Applies each `(id, order)` pair in sequence as an independent patch.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] for the first missing id; pairs before it
    ///   stay applied, pairs after it are skipped.
    pub async fn reorder(&self, updates: Vec<OrderUpdate>) -> StoreResult<()> {
        self.request(|reply| Command::Reorder { updates, reply }).await
    }

    /// Deletes every todo that is completed at call time. Returns how many
    /// were removed.
    pub async fn clear_completed(&self) -> StoreResult<usize> {
        self.request(|reply| Command::ClearCompleted { reply }).await
    }

    /// Stops the writer thread after already queued commands finish.
    ///
    /// Later operations on any clone fail with [`StoreError::Closed`] and
    /// subscriptions end after their last pending snapshot.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Returns whether the writer thread has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StoreResult<T>>) -> Command,
    ) -> StoreResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }
}
