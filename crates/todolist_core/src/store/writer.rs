//! Single-writer loop owning the SQLite connection.
//!
//! # Invariants
//! - Commands are applied strictly one at a time, in queue order. This is
//!   what keeps `create`'s max-plus-one ordinals strictly increasing.
//! - A fresh snapshot is published before the mutation is acknowledged,
//!   and only when the mutation changed state.

use super::list_store::{StoreError, StoreResult};
use super::snapshot::Snapshot;
use crate::model::todo::{OrderUpdate, TodoId, TodoPatch};
use crate::repo::todo_repo::{SqliteTodoRepository, TodoRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};

type Reply<T> = oneshot::Sender<StoreResult<T>>;

pub(crate) enum Command {
    Create {
        title: String,
        reply: Reply<TodoId>,
    },
    Update {
        id: TodoId,
        patch: TodoPatch,
        reply: Reply<()>,
    },
    Toggle {
        id: TodoId,
        reply: Reply<bool>,
    },
    Delete {
        id: TodoId,
        reply: Reply<bool>,
    },
    Reorder {
        updates: Vec<OrderUpdate>,
        reply: Reply<()>,
    },
    ClearCompleted {
        reply: Reply<usize>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Outcome of one applied command: the reply value plus whether the
/// collection changed and needs a new snapshot.
struct Applied<T> {
    result: StoreResult<T>,
    changed: bool,
}

impl<T> Applied<T> {
    fn changed(result: StoreResult<T>) -> Self {
        let changed = result.is_ok();
        Self { result, changed }
    }

    fn unchanged(result: StoreResult<T>) -> Self {
        Self {
            result,
            changed: false,
        }
    }
}

pub(crate) fn run(
    conn: Connection,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Snapshot>,
) {
    let repo = match SqliteTodoRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            error!("event=store_writer module=store status=error error_code=repo_init_failed error={err}");
            return;
        }
    };
    let mut writer = Writer {
        repo,
        snapshots,
        version: 0,
    };

    info!("event=store_writer module=store status=start");
    while let Some(command) = commands.blocking_recv() {
        match command {
            Command::Create { title, reply } => {
                writer.handle("todo_create", reply, |repo| create(repo, &title));
            }
            Command::Update { id, patch, reply } => {
                writer.handle("todo_update", reply, |repo| update(repo, id, &patch));
            }
            Command::Toggle { id, reply } => {
                writer.handle("todo_toggle", reply, |repo| toggle(repo, id));
            }
            Command::Delete { id, reply } => {
                writer.handle("todo_delete", reply, |repo| delete(repo, id));
            }
            Command::Reorder { updates, reply } => {
                writer.handle("todo_reorder", reply, |repo| reorder(repo, &updates));
            }
            Command::ClearCompleted { reply } => {
                writer.handle("todo_clear_completed", reply, |repo| clear_completed(repo));
            }
            Command::Shutdown { reply } => {
                // Handles see `is_closed` as soon as shutdown is acknowledged.
                commands.close();
                let _ = reply.send(());
                break;
            }
        }
    }
    info!("event=store_writer module=store status=stop");
}

struct Writer<'conn> {
    repo: SqliteTodoRepository<'conn>,
    snapshots: watch::Sender<Snapshot>,
    version: u64,
}

impl Writer<'_> {
    fn handle<T>(
        &mut self,
        event: &'static str,
        reply: Reply<T>,
        apply: impl FnOnce(&SqliteTodoRepository<'_>) -> Applied<T>,
    ) {
        let started_at = Instant::now();
        let applied = apply(&self.repo);
        match &applied.result {
            Ok(_) => debug!(
                "event={event} module=store status=ok changed={} duration_ms={}",
                applied.changed,
                started_at.elapsed().as_millis()
            ),
            Err(StoreError::NotFound(id)) => warn!(
                "event={event} module=store status=error error_code=not_found id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={event} module=store status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }

        if applied.changed {
            self.publish();
        }
        // Receiver may already be gone when the caller dropped its future.
        let _ = reply.send(applied.result);
    }

    fn publish(&mut self) {
        match self.repo.list_by_order() {
            Ok(todos) => {
                self.version += 1;
                let count = todos.len();
                self.snapshots.send_replace(Snapshot::new(self.version, todos));
                debug!(
                    "event=snapshot_publish module=store status=ok version={} count={count}",
                    self.version
                );
            }
            Err(err) => {
                error!("event=snapshot_publish module=store status=error error={err}");
            }
        }
    }
}

fn create(repo: &impl TodoRepository, title: &str) -> Applied<TodoId> {
    Applied::changed(
        repo.insert(title)
            .map(|todo| todo.id)
            .map_err(StoreError::from),
    )
}

fn update(repo: &impl TodoRepository, id: TodoId, patch: &TodoPatch) -> Applied<()> {
    let result = repo.patch(id, patch).map_err(StoreError::from);
    if patch.is_empty() {
        Applied::unchanged(result)
    } else {
        Applied::changed(result)
    }
}

fn toggle(repo: &impl TodoRepository, id: TodoId) -> Applied<bool> {
    let current = match repo.get(id) {
        Ok(Some(todo)) => todo,
        Ok(None) => return Applied::unchanged(Err(StoreError::NotFound(id))),
        Err(err) => return Applied::unchanged(Err(err.into())),
    };
    let completed = !current.completed;
    Applied::changed(
        repo.patch(id, &TodoPatch::completed(completed))
            .map(|()| completed)
            .map_err(StoreError::from),
    )
}

fn delete(repo: &impl TodoRepository, id: TodoId) -> Applied<bool> {
    match repo.delete(id) {
        Ok(true) => Applied::changed(Ok(true)),
        Ok(false) => {
            debug!("event=todo_delete module=store status=noop id={id}");
            Applied::unchanged(Ok(false))
        }
        Err(err) => Applied::unchanged(Err(err.into())),
    }
}

fn reorder(repo: &impl TodoRepository, updates: &[OrderUpdate]) -> Applied<()> {
    let mut applied = 0usize;
    for update in updates {
        if let Err(err) = repo.set_order(update.id, update.order) {
            warn!(
                "event=todo_reorder module=store status=partial applied={applied} total={}",
                updates.len()
            );
            return Applied {
                result: Err(err.into()),
                changed: applied > 0,
            };
        }
        applied += 1;
    }
    Applied {
        result: Ok(()),
        changed: applied > 0,
    }
}

fn clear_completed(repo: &impl TodoRepository) -> Applied<usize> {
    let completed: Vec<TodoId> = match repo.list_by_order() {
        Ok(todos) => todos
            .into_iter()
            .filter(|todo| todo.completed)
            .map(|todo| todo.id)
            .collect(),
        Err(err) => return Applied::unchanged(Err(err.into())),
    };

    let mut removed = 0usize;
    for id in completed {
        match repo.delete(id) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(err) => {
                return Applied {
                    result: Err(err.into()),
                    changed: removed > 0,
                };
            }
        }
    }
    Applied {
        result: Ok(removed),
        changed: removed > 0,
    }
}
