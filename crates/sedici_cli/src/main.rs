//! `sedici` command line front end.
//!
//! # Responsibility
//! - Resolve configuration and logging, then open the task database.
//! - Drive the core view models with one action per command and print the
//!   resulting UI-state.
//!
//! # Invariants
//! - Each command waits for its own outcome (navigation, error or state
//!   change) with a bounded timeout.
//! - Failures go to stderr and exit with status 1.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use sedici_core::viewmodel::create_task::CreateTaskUiAction;
use sedici_core::viewmodel::stats::StatsUiState;
use sedici_core::viewmodel::task_details::{TaskDetailsUiAction, TaskDetailsUiState};
use sedici_core::viewmodel::{SnackbarError, UiDestination};
use sedici_core::{AppConfig, AppContainer, Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

const OUTCOME_TIMEOUT: Duration = Duration::from_secs(10);

/// Task list on the command line.
#[derive(Parser)]
#[command(name = "sedici")]
#[command(about = "Manage SediciTasks from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (overrides SEDICI_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute log directory (overrides SEDICI_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// Print the core library version
    Version,
    /// Create a task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Expiration day, YYYY-MM-DD
        #[arg(long)]
        expires: Option<NaiveDate>,
    },
    /// List tasks in display order
    List,
    /// Show one task
    Show { id: TaskId },
    /// Mark a task as done
    Check { id: TaskId },
    /// Mark a task as not done
    Uncheck { id: TaskId },
    /// Change a task's title
    Rename { id: TaskId, title: String },
    /// Change a task's description
    Describe { id: TaskId, text: String },
    /// Set the expiration day, or clear it when omitted
    Expire { id: TaskId, date: Option<NaiveDate> },
    /// Delete a task
    Delete { id: TaskId },
    /// Print task counts
    Stats,
}

#[derive(Debug)]
enum CliError {
    Config(sedici_core::ConfigError),
    Logging(sedici_core::LoggingError),
    Db(sedici_core::DbError),
    NotFound(TaskId),
    Snackbar(SnackbarError),
    TimedOut,
    Closed,
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(err) => write!(f, "logging error: {err}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::NotFound(id) => write!(f, "task {id} not found"),
            Self::Snackbar(err) => write!(f, "{}", err.message()),
            Self::TimedOut => write!(f, "timed out waiting for the operation to finish"),
            Self::Closed => write!(f, "view model stopped before the operation finished"),
        }
    }
}

impl Error for CliError {}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Ping => {
            println!("sedici_core ping={}", sedici_core::ping());
            return Ok(());
        }
        Commands::Version => {
            println!("sedici_core version={}", sedici_core::core_version());
            return Ok(());
        }
        _ => {}
    }

    let mut config = AppConfig::from_env().map_err(CliError::Config)?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_dir) = &config.log_dir {
        sedici_core::init_logging(config.log_level, log_dir).map_err(CliError::Logging)?;
    }

    let app = AppContainer::open(&config).map_err(CliError::Db)?;
    info!("event=cli_command module=cli status=start");
    execute(&app, cli.command).await
}

async fn execute(app: &AppContainer, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Ping | Commands::Version => Ok(()),
        Commands::Add {
            title,
            description,
            expires,
        } => add(app, title, description, expires).await,
        Commands::List => list(app).await,
        Commands::Show { id } => {
            let state = loaded_details(app, id).await?;
            print_details(&state)
        }
        Commands::Check { id } => set_checked(app, id, true).await,
        Commands::Uncheck { id } => set_checked(app, id, false).await,
        Commands::Rename { id, title } => {
            let expected = title.clone();
            edit_details(app, id, TaskDetailsUiAction::EditTitle(title), move |task| {
                task.title == expected
            })
            .await
        }
        Commands::Describe { id, text } => {
            let expected = text.clone();
            edit_details(
                app,
                id,
                TaskDetailsUiAction::EditDescription(text),
                move |task| task.description == expected,
            )
            .await
        }
        Commands::Expire { id, date } => {
            edit_details(
                app,
                id,
                TaskDetailsUiAction::EditExpirationDate(date),
                move |task| task.expires_on.map(|expires_on| expires_on.date_naive()) == date,
            )
            .await
        }
        Commands::Delete { id } => delete(app, id).await,
        Commands::Stats => stats(app).await,
    }
}

async fn add(
    app: &AppContainer,
    title: String,
    description: String,
    expires: Option<NaiveDate>,
) -> Result<(), CliError> {
    let view_model = app.create_task_view_model();
    let mut destinations = view_model.pending_destinations();
    let mut errors = view_model.pending_snackbar_errors();

    view_model.submit_ui_action(CreateTaskUiAction::EditTitle(title));
    view_model.submit_ui_action(CreateTaskUiAction::EditDescription(description));
    if let Some(date) = expires {
        view_model.submit_ui_action(CreateTaskUiAction::SetExpirationDate(date));
    }
    view_model.submit_ui_action(CreateTaskUiAction::SaveTask);

    await_navigation_up(&mut destinations, &mut errors).await?;
    println!("saved");
    Ok(())
}

async fn list(app: &AppContainer) -> Result<(), CliError> {
    let view_model = app.tasks_view_model();
    let mut ui_state = view_model.ui_state();
    let mut errors = view_model.pending_snackbar_errors();

    let state = await_state(&mut ui_state, &mut errors, |state| state.loaded).await?;
    if state.tasks.is_empty() {
        println!("no tasks");
    }
    for task in &state.tasks {
        println!("{}", task_line(task));
    }
    Ok(())
}

async fn set_checked(app: &AppContainer, id: TaskId, is_checked: bool) -> Result<(), CliError> {
    edit_details(
        app,
        id,
        TaskDetailsUiAction::EditIsChecked(is_checked),
        move |task| task.is_checked == is_checked,
    )
    .await
}

/// Opens the details screen for `id` and waits for the first lookup.
async fn loaded_details(app: &AppContainer, id: TaskId) -> Result<TaskDetailsUiState, CliError> {
    let view_model = app.task_details_view_model(id);
    let mut ui_state = view_model.ui_state();
    let mut errors = view_model.pending_snackbar_errors();

    let state = await_state(&mut ui_state, &mut errors, |state| state.loaded).await?;
    if state.task.is_none() {
        return Err(CliError::NotFound(id));
    }
    Ok(state)
}

async fn edit_details<P>(
    app: &AppContainer,
    id: TaskId,
    action: TaskDetailsUiAction,
    mut applied: P,
) -> Result<(), CliError>
where
    P: FnMut(&Task) -> bool,
{
    let view_model = app.task_details_view_model(id);
    let mut ui_state = view_model.ui_state();
    let mut errors = view_model.pending_snackbar_errors();

    let loaded = await_state(&mut ui_state, &mut errors, |state| state.loaded).await?;
    if loaded.task.is_none() {
        return Err(CliError::NotFound(id));
    }

    view_model.submit_ui_action(action);
    let state = await_state(&mut ui_state, &mut errors, |state| {
        !state.loading && state.task.as_ref().is_some_and(&mut applied)
    })
    .await?;
    print_details(&state)
}

async fn delete(app: &AppContainer, id: TaskId) -> Result<(), CliError> {
    let view_model = app.task_details_view_model(id);
    let mut ui_state = view_model.ui_state();
    let mut destinations = view_model.pending_destinations();
    let mut errors = view_model.pending_snackbar_errors();

    let loaded = await_state(&mut ui_state, &mut errors, |state| state.loaded).await?;
    if loaded.task.is_none() {
        return Err(CliError::NotFound(id));
    }

    view_model.submit_ui_action(TaskDetailsUiAction::Delete);
    await_navigation_up(&mut destinations, &mut errors).await?;
    println!("deleted {id}");
    Ok(())
}

async fn stats(app: &AppContainer) -> Result<(), CliError> {
    let view_model = app.stats_view_model();
    let mut ui_state = view_model.ui_state();
    let mut errors = view_model.pending_snackbar_errors();

    let StatsUiState {
        total,
        checked,
        unchecked,
        expired,
        ..
    } = await_state(&mut ui_state, &mut errors, |state| state.loaded).await?;
    println!("total={total} checked={checked} unchecked={unchecked} expired={expired}");
    Ok(())
}

/// Waits until `done` holds for the UI-state, failing on the first snackbar.
async fn await_state<S, P>(
    ui_state: &mut watch::Receiver<S>,
    errors: &mut broadcast::Receiver<SnackbarError>,
    done: P,
) -> Result<S, CliError>
where
    S: Clone,
    P: FnMut(&S) -> bool,
{
    let outcome = async {
        tokio::select! {
            state = ui_state.wait_for(done) => {
                state.map(|state| state.clone()).map_err(|_| CliError::Closed)
            }
            error = errors.recv() => match error {
                Ok(error) => Err(CliError::Snackbar(error)),
                Err(_) => Err(CliError::Closed),
            },
        }
    };
    tokio::time::timeout(OUTCOME_TIMEOUT, outcome)
        .await
        .map_err(|_| CliError::TimedOut)?
}

async fn await_navigation_up(
    destinations: &mut broadcast::Receiver<UiDestination>,
    errors: &mut broadcast::Receiver<SnackbarError>,
) -> Result<(), CliError> {
    let outcome = async {
        loop {
            tokio::select! {
                destination = destinations.recv() => match destination {
                    Ok(UiDestination::Up) => return Ok(()),
                    Ok(_) => continue,
                    Err(_) => return Err(CliError::Closed),
                },
                error = errors.recv() => match error {
                    Ok(error) => return Err(CliError::Snackbar(error)),
                    Err(_) => return Err(CliError::Closed),
                },
            }
        }
    };
    tokio::time::timeout(OUTCOME_TIMEOUT, outcome)
        .await
        .map_err(|_| CliError::TimedOut)?
}

fn task_line(task: &Task) -> String {
    let mark = if task.is_checked { "x" } else { " " };
    let expires = task
        .expires_on
        .map(|expires_on| format!(" (expires {})", expires_on.date_naive()))
        .unwrap_or_default();
    format!("[{mark}] {} {}{expires}", task.id, task.title)
}

fn print_details(state: &TaskDetailsUiState) -> Result<(), CliError> {
    let Some(task) = &state.task else {
        return Ok(());
    };
    println!("{}", task_line(task));
    if !task.description.is_empty() {
        println!("    {}", task.description);
    }
    println!("    created {}", task.created_at.to_rfc3339());
    println!("    updated {}", task.updated_at.to_rfc3339());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{await_navigation_up, await_state, execute, loaded_details, Cli, CliError, Commands};
    use chrono::NaiveDate;
    use clap::Parser;
    use sedici_core::viewmodel::{SnackbarError, UiDestination};
    use sedici_core::{AppContainer, TaskRepository};
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::sync::{broadcast, watch};

    async fn add(app: &AppContainer, title: &str) -> sedici_core::Task {
        execute(
            app,
            Commands::Add {
                title: title.to_string(),
                description: String::new(),
                expires: None,
            },
        )
        .await
        .unwrap();
        let tasks = app.repository().list_tasks().unwrap();
        tasks.into_iter().find(|task| task.title == title).unwrap()
    }

    #[test]
    fn expire_without_date_parses_as_clear() {
        let id = "11111111-2222-4333-8444-555555555555";
        let cli = Cli::try_parse_from(["sedici", "--db", "/tmp/t.db", "expire", id]).unwrap();
        match cli.command {
            Commands::Expire { date, .. } => assert!(date.is_none()),
            _ => panic!("expected expire command"),
        }
        assert_eq!(cli.db.unwrap().to_str(), Some("/tmp/t.db"));
    }

    #[tokio::test]
    async fn add_then_edit_commands_reach_the_store() {
        let app = AppContainer::in_memory().unwrap();
        let task = add(&app, "write report").await;
        let date = NaiveDate::from_ymd_opt(2031, 5, 6).unwrap();

        execute(&app, Commands::Check { id: task.id }).await.unwrap();
        execute(
            &app,
            Commands::Rename {
                id: task.id,
                title: "write final report".to_string(),
            },
        )
        .await
        .unwrap();
        execute(
            &app,
            Commands::Expire {
                id: task.id,
                date: Some(date),
            },
        )
        .await
        .unwrap();

        let stored = app.repository().get_task_by_id(task.id).unwrap().unwrap();
        assert!(stored.is_checked);
        assert_eq!(stored.title, "write final report");
        assert_eq!(stored.expires_on.map(|value| value.date_naive()), Some(date));

        execute(&app, Commands::List).await.unwrap();
        execute(&app, Commands::Stats).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_the_task_and_missing_ids_are_reported() {
        let app = AppContainer::in_memory().unwrap();
        let task = add(&app, "temporary").await;

        execute(&app, Commands::Delete { id: task.id }).await.unwrap();
        assert!(app.repository().list_tasks().unwrap().is_empty());

        let err = execute(&app, Commands::Delete { id: task.id })
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::NotFound(id) if id == task.id));
        assert!(matches!(
            loaded_details(&app, task.id).await,
            Err(CliError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn await_state_fails_on_the_first_snackbar() {
        let (_state_tx, mut state) = watch::channel(false);
        let (errors_tx, mut errors) = broadcast::channel(4);
        errors_tx.send(SnackbarError::ErrorWhileSaving).unwrap();

        let result = await_state(&mut state, &mut errors, |ready| *ready).await;
        assert!(matches!(
            result,
            Err(CliError::Snackbar(SnackbarError::ErrorWhileSaving))
        ));
    }

    #[tokio::test]
    async fn await_state_reports_a_stopped_view_model() {
        let (state_tx, mut state) = watch::channel(false);
        let (_errors_tx, mut errors) = broadcast::channel::<SnackbarError>(4);
        drop(state_tx);

        let result = await_state(&mut state, &mut errors, |ready| *ready).await;
        assert!(matches!(result, Err(CliError::Closed)));
    }

    #[tokio::test]
    async fn await_navigation_up_skips_other_destinations() {
        let (destinations_tx, mut destinations) = broadcast::channel(4);
        let (_errors_tx, mut errors) = broadcast::channel::<SnackbarError>(4);
        destinations_tx.send(UiDestination::Stats).unwrap();
        destinations_tx.send(UiDestination::Up).unwrap();

        await_navigation_up(&mut destinations, &mut errors)
            .await
            .unwrap();
        assert!(matches!(destinations.try_recv(), Err(TryRecvError::Empty)));
    }
}
