//! Task statistics screen.
//!
//! `expired` is evaluated at the instant the current task list was first
//! seen, so `ui_state()` and `current_state()` agree until the list changes.

use super::action::{ActionQueue, UiActionHandler};
use super::combine::{combine, Input, TaskGuard};
use super::events::{OneShotEvents, SnackbarError, UiDestination};
use crate::model::task::{now_offset, Task};
use crate::repo::task_repo::TaskRepository;
use crate::service::observe::ObserveTasks;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsUiState {
    pub total: usize,
    pub checked: usize,
    pub unchecked: usize,
    /// Unchecked tasks whose expiration lies before the evaluation instant.
    pub expired: usize,
    /// The screen launches no interactor calls, so this stays false.
    pub loading: bool,
    /// False until the first task list has been delivered.
    pub loaded: bool,
}

impl StatsUiState {
    /// Counts `tasks` as of `now`; `None` means the list has not arrived yet.
    pub fn from_tasks(tasks: Option<&[Task]>, now: DateTime<FixedOffset>) -> Self {
        let Some(tasks) = tasks else {
            return Self::default();
        };

        let checked = tasks.iter().filter(|task| task.is_checked).count();
        Self {
            total: tasks.len(),
            checked,
            unchecked: tasks.len() - checked,
            expired: tasks.iter().filter(|task| task.is_expired_at(now)).count(),
            loading: false,
            loaded: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsUiAction {
    NavigateUp,
}

struct StatsScreen {
    observe_tasks: ObserveTasks,
    tasks: watch::Receiver<Option<Vec<Task>>>,
    evaluated: Mutex<Option<(Vec<Task>, DateTime<FixedOffset>)>>,
    destinations: OneShotEvents<UiDestination>,
    snackbar_errors: OneShotEvents<SnackbarError>,
}

impl StatsScreen {
    fn snapshot(&self) -> StatsUiState {
        let tasks = self.tasks.borrow().clone();
        let Some(tasks) = tasks else {
            return StatsUiState::default();
        };

        let mut evaluated = self.evaluated.lock();
        let now = match evaluated.as_ref() {
            Some((seen, at)) if *seen == tasks => *at,
            _ => {
                let at = now_offset();
                *evaluated = Some((tasks.clone(), at));
                at
            }
        };
        StatsUiState::from_tasks(Some(&tasks), now)
    }
}

#[async_trait]
impl UiActionHandler<StatsUiAction> for StatsScreen {
    async fn handle_ui_action(&self, action: StatsUiAction) {
        match action {
            StatsUiAction::NavigateUp => {
                self.destinations.emit(UiDestination::Up);
            }
        }
    }
}

/// View model of the statistics screen.
pub struct StatsViewModel {
    screen: Arc<StatsScreen>,
    ui_state: watch::Receiver<StatsUiState>,
    actions: ActionQueue<StatsUiAction>,
    _composer: TaskGuard,
}

impl StatsViewModel {
    /// Starts observing the task list. Must be called within a Tokio runtime.
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        let observe_tasks = ObserveTasks::new(repo);
        observe_tasks.invoke();
        let tasks = observe_tasks.flow();

        let screen = Arc::new(StatsScreen {
            observe_tasks,
            tasks,
            evaluated: Mutex::new(None),
            destinations: OneShotEvents::new(),
            snackbar_errors: OneShotEvents::new(),
        });

        let inputs: Vec<Box<dyn Input>> = vec![Box::new(screen.observe_tasks.flow())];
        let projection = Arc::clone(&screen);
        let (ui_state, composer) = combine(inputs, move || projection.snapshot());
        let actions = ActionQueue::spawn("stats", Arc::clone(&screen));

        Self {
            screen,
            ui_state,
            actions,
            _composer: composer,
        }
    }

    pub fn ui_state(&self) -> watch::Receiver<StatsUiState> {
        self.ui_state.clone()
    }

    pub fn current_state(&self) -> StatsUiState {
        self.screen.snapshot()
    }

    pub fn submit_ui_action(&self, action: StatsUiAction) {
        self.actions.submit(action);
    }

    pub fn pending_destinations(&self) -> broadcast::Receiver<UiDestination> {
        self.screen.destinations.subscribe()
    }

    /// Never emits today; kept for parity with the other screens.
    pub fn pending_snackbar_errors(&self) -> broadcast::Receiver<SnackbarError> {
        self.screen.snackbar_errors.subscribe()
    }
}
