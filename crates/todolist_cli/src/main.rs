//! Command-line client for the todo list.
//!
//! # Responsibility
//! - Map subcommands onto `TodoService` calls over the configured database.
//! - Render the list the same way the mobile client derives it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todolist_core::{
    init_logging, CoreConfig, DisplayPolicy, FilterMode, ListStore, LiveList, Reconciler, Todo,
    TodoId, TodoService,
};

/// Ordered todo list backed by SQLite.
#[derive(Parser, Debug)]
#[command(name = "todolist", version, about = "todolist: an ordered todo list")]
struct Cli {
    /// Database file (overrides TODOLIST_DB_PATH).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Show completed todos before open ones.
    #[arg(long)]
    completed_first: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a todo to the end of the list.
    Add { title: String },

    /// Print the list.
    List {
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: FilterMode,
    },

    /// Flip the completed flag of a todo.
    Toggle { id: TodoId },

    /// Replace the title of a todo.
    Edit { id: TodoId, title: String },

    /// Delete a todo.
    Rm { id: TodoId },

    /// Put the given todos in this exact sequence.
    Move {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<TodoId>,
    },

    /// Delete every completed todo.
    ClearCompleted,

    /// Print the list again after every change.
    Watch {
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: FilterMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        db,
        completed_first,
        cmd,
    } = Cli::parse();

    let mut config = CoreConfig::from_env()?;
    if let Some(path) = db {
        config.db_path = path;
    }
    if completed_first {
        config.display_policy = DisplayPolicy::CompletedFirst;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let store = ListStore::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let service = TodoService::new(store);
    let result = execute_command(cmd, &service, config.display_policy).await;
    service.store().shutdown().await;
    result
}

async fn execute_command(
    command: Command,
    service: &TodoService,
    policy: DisplayPolicy,
) -> Result<()> {
    match command {
        Command::Add { title } => {
            let id = service.create(&title).await?;
            println!("{id}");
        }
        Command::List { filter } => {
            let mut reconciler = Reconciler::new(policy);
            reconciler.apply_snapshot(service.snapshot());
            reconciler.set_filter(filter);
            print_list(&reconciler.visible(), reconciler.active_count());
        }
        Command::Toggle { id } => {
            let completed = service.toggle(id).await?;
            println!("{id} {}", if completed { "completed" } else { "reopened" });
        }
        Command::Edit { id, title } => service.rename(id, &title).await?,
        Command::Rm { id } => {
            if !service.delete(id).await? {
                println!("{id} not found; nothing deleted");
            }
        }
        Command::Move { ids } => service.reorder_visible(&ids).await?,
        Command::ClearCompleted => {
            let removed = service.clear_completed().await?;
            println!("removed {removed}");
        }
        Command::Watch { filter } => {
            let mut live = LiveList::attach(service.store().clone(), policy);
            live.set_filter(filter);
            print_list(&live.visible(), live.active_count());
            while live.refresh().await {
                println!();
                print_list(&live.visible(), live.active_count());
            }
        }
    }
    Ok(())
}

fn parse_filter(value: &str) -> Result<FilterMode, String> {
    FilterMode::parse(value).map_err(|err| err.to_string())
}

fn print_list(todos: &[Todo], active_count: usize) {
    for todo in todos {
        println!("{}", render_row(todo));
    }
    println!("{active_count} item(s) left");
}

fn render_row(todo: &Todo) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    format!("[{mark}] {:>4} {} {}", todo.order, todo.id, todo.title)
}
