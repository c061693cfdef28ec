//! Task details screen.
//!
//! # Invariants
//! - Bound to one task id for its whole lifetime.
//! - `task` is `None` while the first lookup is pending and after the task
//!   has been deleted.
//! - Field edits go straight to the store; the snapshot reflects them once
//!   the live query re-runs.

use super::action::{watch_status, ActionQueue, OnSuccess, UiActionHandler};
use super::combine::{combine, Input, StateCell, TaskGuard};
use super::events::{OneShotEvents, SnackbarError, UiDestination};
use super::loading::LoadingCounter;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::TaskRepository;
use crate::service::interactor::{Interactor, InvokeStatusStream};
use crate::service::observe::ObserveTaskById;
use crate::service::task_interactors::{
    DeleteTaskById, SetTaskDescriptionById, SetTaskDescriptionParams, SetTaskExpirationDateById,
    SetTaskExpirationDateParams, SetTaskIsCheckedById, SetTaskIsCheckedParams, SetTaskTitleById,
    SetTaskTitleParams,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetailsUiState {
    pub task: Option<Task>,
    /// True while at least one launched write is unresolved.
    pub loading: bool,
    /// False until the first lookup has answered, even with "not found".
    pub loaded: bool,
    pub show_confirm_delete_dialog: bool,
    pub show_expiration_date_picker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDetailsUiAction {
    ShowConfirmDeleteDialog,
    DismissConfirmDeleteDialog,
    Delete,
    EditTitle(String),
    EditDescription(String),
    EditIsChecked(bool),
    ShowExpirationDatePicker,
    DismissExpirationDatePicker,
    EditExpirationDate(Option<NaiveDate>),
    NavigateUp,
}

struct TaskDetailsScreen {
    task_id: TaskId,
    observe_task: ObserveTaskById,
    task: watch::Receiver<Option<Option<Task>>>,
    show_confirm_delete_dialog: StateCell<bool>,
    show_expiration_date_picker: StateCell<bool>,
    delete_task: DeleteTaskById,
    set_title: SetTaskTitleById,
    set_description: SetTaskDescriptionById,
    set_is_checked: SetTaskIsCheckedById,
    set_expiration_date: SetTaskExpirationDateById,
    loading: LoadingCounter,
    destinations: OneShotEvents<UiDestination>,
    snackbar_errors: OneShotEvents<SnackbarError>,
}

impl TaskDetailsScreen {
    fn snapshot(&self) -> TaskDetailsUiState {
        let task = self.task.borrow().clone();
        TaskDetailsUiState {
            loading: self.loading.is_loading(),
            loaded: task.is_some(),
            task: task.flatten(),
            show_confirm_delete_dialog: self.show_confirm_delete_dialog.get(),
            show_expiration_date_picker: self.show_expiration_date_picker.get(),
        }
    }

    fn inputs(&self) -> Vec<Box<dyn Input>> {
        vec![
            Box::new(self.observe_task.flow()),
            Box::new(self.show_confirm_delete_dialog.observe()),
            Box::new(self.show_expiration_date_picker.observe()),
            Box::new(self.loading.observe()),
        ]
    }

    fn watch(
        &self,
        statuses: InvokeStatusStream,
        on_error: SnackbarError,
        on_success: Option<OnSuccess>,
    ) {
        watch_status(
            statuses,
            self.loading.clone(),
            self.snackbar_errors.clone(),
            on_error,
            on_success,
        );
    }

    fn navigate_up_on_success(&self) -> Option<OnSuccess> {
        let destinations = self.destinations.clone();
        Some(Box::new(move || {
            destinations.emit(UiDestination::Up);
        }))
    }
}

#[async_trait]
impl UiActionHandler<TaskDetailsUiAction> for TaskDetailsScreen {
    async fn handle_ui_action(&self, action: TaskDetailsUiAction) {
        let id = self.task_id;
        match action {
            TaskDetailsUiAction::ShowConfirmDeleteDialog => {
                self.show_confirm_delete_dialog.set(true);
            }
            TaskDetailsUiAction::DismissConfirmDeleteDialog => {
                self.show_confirm_delete_dialog.set(false);
            }
            TaskDetailsUiAction::Delete => {
                self.show_confirm_delete_dialog.set(false);
                self.watch(
                    self.delete_task.invoke(id),
                    SnackbarError::ErrorWhileDeleting,
                    self.navigate_up_on_success(),
                );
            }
            TaskDetailsUiAction::EditTitle(title) => {
                self.watch(
                    self.set_title.invoke(SetTaskTitleParams { id, title }),
                    SnackbarError::UnknownError,
                    None,
                );
            }
            TaskDetailsUiAction::EditDescription(description) => {
                self.watch(
                    self.set_description
                        .invoke(SetTaskDescriptionParams { id, description }),
                    SnackbarError::UnknownError,
                    None,
                );
            }
            TaskDetailsUiAction::EditIsChecked(is_checked) => {
                let on_success = if is_checked {
                    self.navigate_up_on_success()
                } else {
                    None
                };
                self.watch(
                    self.set_is_checked
                        .invoke(SetTaskIsCheckedParams { id, is_checked }),
                    SnackbarError::UnknownError,
                    on_success,
                );
            }
            TaskDetailsUiAction::ShowExpirationDatePicker => {
                self.show_expiration_date_picker.set(true);
            }
            TaskDetailsUiAction::DismissExpirationDatePicker => {
                self.show_expiration_date_picker.set(false);
            }
            TaskDetailsUiAction::EditExpirationDate(expiration_date) => {
                self.show_expiration_date_picker.set(false);
                self.watch(
                    self.set_expiration_date.invoke(SetTaskExpirationDateParams {
                        id,
                        expiration_date,
                    }),
                    SnackbarError::UnknownError,
                    None,
                );
            }
            TaskDetailsUiAction::NavigateUp => {
                self.destinations.emit(UiDestination::Up);
            }
        }
    }
}

/// View model of one task's details.
pub struct TaskDetailsViewModel {
    screen: Arc<TaskDetailsScreen>,
    ui_state: watch::Receiver<TaskDetailsUiState>,
    actions: ActionQueue<TaskDetailsUiAction>,
    _composer: TaskGuard,
}

impl TaskDetailsViewModel {
    /// Starts observing `task_id`. Must be called within a Tokio runtime.
    pub fn new(repo: Arc<dyn TaskRepository>, task_id: TaskId) -> Self {
        let observe_task = ObserveTaskById::new(Arc::clone(&repo));
        observe_task.invoke(task_id);
        let task = observe_task.flow();

        let screen = Arc::new(TaskDetailsScreen {
            task_id,
            observe_task,
            task,
            show_confirm_delete_dialog: StateCell::new(false),
            show_expiration_date_picker: StateCell::new(false),
            delete_task: DeleteTaskById::new(Arc::clone(&repo)),
            set_title: SetTaskTitleById::new(Arc::clone(&repo)),
            set_description: SetTaskDescriptionById::new(Arc::clone(&repo)),
            set_is_checked: SetTaskIsCheckedById::new(Arc::clone(&repo)),
            set_expiration_date: SetTaskExpirationDateById::new(repo),
            loading: LoadingCounter::new(),
            destinations: OneShotEvents::new(),
            snackbar_errors: OneShotEvents::new(),
        });

        let projection = Arc::clone(&screen);
        let (ui_state, composer) = combine(screen.inputs(), move || projection.snapshot());
        let actions = ActionQueue::spawn("task_details", Arc::clone(&screen));

        Self {
            screen,
            ui_state,
            actions,
            _composer: composer,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.screen.task_id
    }

    pub fn ui_state(&self) -> watch::Receiver<TaskDetailsUiState> {
        self.ui_state.clone()
    }

    pub fn current_state(&self) -> TaskDetailsUiState {
        self.screen.snapshot()
    }

    pub fn submit_ui_action(&self, action: TaskDetailsUiAction) {
        self.actions.submit(action);
    }

    pub fn pending_destinations(&self) -> broadcast::Receiver<UiDestination> {
        self.screen.destinations.subscribe()
    }

    pub fn pending_snackbar_errors(&self) -> broadcast::Receiver<SnackbarError> {
        self.screen.snackbar_errors.subscribe()
    }
}
