//! Task list screen.

use super::action::{watch_status, ActionQueue, UiActionHandler};
use super::combine::{combine, Input, TaskGuard};
use super::events::{OneShotEvents, SnackbarError, UiDestination};
use super::loading::LoadingCounter;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::TaskRepository;
use crate::service::interactor::Interactor;
use crate::service::observe::ObserveTasks;
use crate::service::task_interactors::{SetTaskIsCheckedById, SetTaskIsCheckedParams};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksUiState {
    /// Ordered task list; empty until the first query result arrives.
    pub tasks: Vec<Task>,
    /// True while at least one launched write is unresolved.
    pub loading: bool,
    /// False until the first query result has been delivered.
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TasksUiAction {
    EditTaskIsChecked { task_id: TaskId, checked: bool },
    OpenTask(TaskId),
    CreateTask,
    OpenStats,
}

struct TasksScreen {
    observe_tasks: ObserveTasks,
    tasks: watch::Receiver<Option<Vec<Task>>>,
    set_task_is_checked: SetTaskIsCheckedById,
    loading: LoadingCounter,
    destinations: OneShotEvents<UiDestination>,
    snackbar_errors: OneShotEvents<SnackbarError>,
}

impl TasksScreen {
    fn snapshot(&self) -> TasksUiState {
        let tasks = self.tasks.borrow().clone();
        TasksUiState {
            loading: self.loading.is_loading(),
            loaded: tasks.is_some(),
            tasks: tasks.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl UiActionHandler<TasksUiAction> for TasksScreen {
    async fn handle_ui_action(&self, action: TasksUiAction) {
        match action {
            TasksUiAction::EditTaskIsChecked { task_id, checked } => {
                let statuses = self.set_task_is_checked.invoke(SetTaskIsCheckedParams {
                    id: task_id,
                    is_checked: checked,
                });
                watch_status(
                    statuses,
                    self.loading.clone(),
                    self.snackbar_errors.clone(),
                    SnackbarError::UnknownError,
                    None,
                );
            }
            TasksUiAction::OpenTask(id) => {
                self.destinations.emit(UiDestination::TaskDetails(id));
            }
            TasksUiAction::CreateTask => {
                self.destinations.emit(UiDestination::CreateTask);
            }
            TasksUiAction::OpenStats => {
                self.destinations.emit(UiDestination::Stats);
            }
        }
    }
}

/// View model of the task list.
pub struct TasksViewModel {
    screen: Arc<TasksScreen>,
    ui_state: watch::Receiver<TasksUiState>,
    actions: ActionQueue<TasksUiAction>,
    _composer: TaskGuard,
}

impl TasksViewModel {
    /// Starts observing the task list. Must be called within a Tokio runtime.
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        let observe_tasks = ObserveTasks::new(Arc::clone(&repo));
        observe_tasks.invoke();
        let tasks = observe_tasks.flow();

        let screen = Arc::new(TasksScreen {
            observe_tasks,
            tasks,
            set_task_is_checked: SetTaskIsCheckedById::new(repo),
            loading: LoadingCounter::new(),
            destinations: OneShotEvents::new(),
            snackbar_errors: OneShotEvents::new(),
        });

        let inputs: Vec<Box<dyn Input>> = vec![
            Box::new(screen.observe_tasks.flow()),
            Box::new(screen.loading.observe()),
        ];
        let projection = Arc::clone(&screen);
        let (ui_state, composer) = combine(inputs, move || projection.snapshot());
        let actions = ActionQueue::spawn("tasks", Arc::clone(&screen));

        Self {
            screen,
            ui_state,
            actions,
            _composer: composer,
        }
    }

    pub fn ui_state(&self) -> watch::Receiver<TasksUiState> {
        self.ui_state.clone()
    }

    pub fn current_state(&self) -> TasksUiState {
        self.screen.snapshot()
    }

    pub fn submit_ui_action(&self, action: TasksUiAction) {
        self.actions.submit(action);
    }

    pub fn pending_destinations(&self) -> broadcast::Receiver<UiDestination> {
        self.screen.destinations.subscribe()
    }

    pub fn pending_snackbar_errors(&self) -> broadcast::Receiver<SnackbarError> {
        self.screen.snackbar_errors.subscribe()
    }
}
