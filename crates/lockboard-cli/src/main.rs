//! lockboard: offline companion tool for the encrypted kanban board.
//!
//! Commands:
//!   init                - create (or re-initialize) the encrypted board file
//!   show                - decrypt and print the board document
//!   verify              - check the access credential against the remote
//!   add-project <name>  - add a project
//!   add-task <project-id> <title> - add a task
//!   move-task <task-id> <status>  - move a task to another column
//!   delete-task <task-id>         - delete a task
//!
//! Every mutating command runs the same load → mutate → encrypt → write
//! cycle as the web client, against the same remote file, with a
//! byte-compatible envelope format.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use tracing::debug;

use lockboard_core::config::BoardConfig;
use lockboard_core::{BoardDocument, TaskPriority, TaskStatus};
use lockboard_crypto::seal;
use lockboard_store::{BlobStore, GitHubStore};
use lockboard_sync::document::{add_project, add_task, move_task, remove_task, NewTask};
use lockboard_sync::Synchronizer;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lockboard",
    version,
    about = "Encrypted kanban board client",
    long_about = "lockboard: manage the password-protected board stored as an \
                  encrypted file in a remote repository"
)]
struct Cli {
    /// Path to lockboard.toml configuration file
    #[arg(long, short = 'c', env = "LOCKBOARD_CONFIG", default_value = "lockboard.toml")]
    config: PathBuf,

    /// Access token for the remote repository
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, default_value = "")]
    token: String,

    /// Board password (prompted interactively when not set)
    #[arg(long, env = "LOCKBOARD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOCKBOARD_LOG", default_value = "warn")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "LOCKBOARD_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the encrypted board file, or re-initialize it to empty
    Init,

    /// Decrypt and print the board document as JSON
    Show,

    /// Check that the access credential can reach the repository
    Verify,

    /// Add a project
    AddProject {
        name: String,
        description: Option<String>,
    },

    /// Add a task to a project
    AddTask {
        project_id: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Column: backlog, in-progress, review, done
        #[arg(long, default_value = "backlog")]
        status: TaskStatus,
        /// Priority: low, medium, high
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
    },

    /// Move a task to another column
    MoveTask {
        task_id: String,
        /// Column: backlog, in-progress, review, done
        status: TaskStatus,
    },

    /// Delete a task
    DeleteTask { task_id: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config,
        token,
        password,
        log,
        log_format,
        command,
    } = Cli::parse();
    init_logging(&log, &log_format);

    let config = BoardConfig::load(&config)?;
    debug!(
        owner = %config.remote.owner,
        repo = %config.remote.repo,
        path = %config.remote.path,
        "remote configured"
    );

    let store: Arc<dyn BlobStore> =
        Arc::new(GitHubStore::new(&config.remote, token).context("building remote client")?);

    match command {
        Commands::Verify => cmd_verify(&store).await,
        Commands::Init => cmd_init(&store, &read_password(password.as_deref())?).await,
        Commands::Show => cmd_show(&store, &read_password(password.as_deref())?).await,
        Commands::AddProject { name, description } => {
            cmd_add_project(&store, &read_password(password.as_deref())?, name, description).await
        }
        Commands::AddTask {
            project_id,
            title,
            description,
            status,
            priority,
        } => {
            let new = NewTask {
                project_id,
                title,
                description,
                status,
                priority,
            };
            cmd_add_task(&store, &read_password(password.as_deref())?, new).await
        }
        Commands::MoveTask { task_id, status } => {
            cmd_move_task(&store, &read_password(password.as_deref())?, &task_id, status).await
        }
        Commands::DeleteTask { task_id } => {
            cmd_delete_task(&store, &read_password(password.as_deref())?, &task_id).await
        }
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn read_password(explicit: Option<&str>) -> Result<SecretString> {
    if let Some(password) = explicit {
        return Ok(SecretString::from(password.to_string()));
    }
    let password =
        rpassword::prompt_password("Board password: ").context("reading password from terminal")?;
    Ok(SecretString::from(password))
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn cmd_verify(store: &Arc<dyn BlobStore>) -> Result<()> {
    if store.verify_credential().await.context("credential probe")? {
        println!("credential ok");
        Ok(())
    } else {
        anyhow::bail!("credential rejected by the remote")
    }
}

/// Create or re-initialize the board file as an empty encrypted document.
///
/// Unlike the other commands this does not decrypt the current content: it
/// reads only to obtain the revision tag, so a board with a lost password
/// can be reset.
async fn cmd_init(store: &Arc<dyn BlobStore>, password: &SecretString) -> Result<()> {
    let existing = store.read().await.context("checking for existing board")?;
    let empty = serde_json::to_string(&BoardDocument::default())?;
    let sealed = seal(&empty, password)?;

    store
        .write(&sealed, existing.as_ref().map(|b| b.revision.as_str()))
        .await
        .context("writing initial board")?;

    match existing {
        Some(_) => println!("board re-initialized (previous content replaced)"),
        None => println!("board initialized"),
    }
    Ok(())
}

async fn cmd_show(store: &Arc<dyn BlobStore>, password: &SecretString) -> Result<()> {
    let sync = Synchronizer::new(Arc::clone(store));
    let outcome = sync.load(password).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.document)?);
    Ok(())
}

async fn cmd_add_project(
    store: &Arc<dyn BlobStore>,
    password: &SecretString,
    name: String,
    description: Option<String>,
) -> Result<()> {
    let sync = Synchronizer::new(Arc::clone(store));
    let loaded = sync.load(password).await?;

    let doc = add_project(&loaded.document, name.clone(), description);
    sync.save(&doc, password, loaded.revision.as_deref()).await?;

    println!("project {name:?} added");
    Ok(())
}

async fn cmd_add_task(
    store: &Arc<dyn BlobStore>,
    password: &SecretString,
    new: NewTask,
) -> Result<()> {
    let sync = Synchronizer::new(Arc::clone(store));
    let loaded = sync.load(password).await?;

    if loaded.document.project(&new.project_id).is_none() {
        anyhow::bail!("project not found: {}", new.project_id);
    }

    let title = new.title.clone();
    let doc = add_task(&loaded.document, new);
    sync.save(&doc, password, loaded.revision.as_deref()).await?;

    println!("task {title:?} added");
    Ok(())
}

async fn cmd_move_task(
    store: &Arc<dyn BlobStore>,
    password: &SecretString,
    task_id: &str,
    status: TaskStatus,
) -> Result<()> {
    let sync = Synchronizer::new(Arc::clone(store));
    let loaded = sync.load(password).await?;

    if loaded.document.task(task_id).is_none() {
        anyhow::bail!("task not found: {task_id}");
    }

    let doc = move_task(&loaded.document, task_id, status);
    sync.save(&doc, password, loaded.revision.as_deref()).await?;

    println!("task moved to {status}");
    Ok(())
}

async fn cmd_delete_task(
    store: &Arc<dyn BlobStore>,
    password: &SecretString,
    task_id: &str,
) -> Result<()> {
    let sync = Synchronizer::new(Arc::clone(store));
    let loaded = sync.load(password).await?;

    if loaded.document.task(task_id).is_none() {
        anyhow::bail!("task not found: {task_id}");
    }

    let doc = remove_task(&loaded.document, task_id);
    sync.save(&doc, password, loaded.revision.as_deref()).await?;

    println!("task deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_task_parses_status_and_priority() {
        let cli = Cli::parse_from([
            "lockboard",
            "--password",
            "pw",
            "add-task",
            "p1",
            "Buy milk",
            "--status",
            "in-progress",
            "--priority",
            "high",
        ]);
        match cli.command {
            Commands::AddTask {
                status, priority, ..
            } => {
                assert_eq!(status, TaskStatus::InProgress);
                assert_eq!(priority, TaskPriority::High);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn add_task_defaults_to_backlog_medium() {
        let cli = Cli::parse_from(["lockboard", "--password", "pw", "add-task", "p1", "t"]);
        match cli.command {
            Commands::AddTask {
                status, priority, ..
            } => {
                assert_eq!(status, TaskStatus::Backlog);
                assert_eq!(priority, TaskPriority::Medium);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
