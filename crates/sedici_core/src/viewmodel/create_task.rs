//! Create-task form screen.
//!
//! # Invariants
//! - The form starts empty; `SaveTask` persists exactly the fields of the
//!   snapshot current when the action is handled.
//! - Leaving with unsaved edits requires confirming the discard dialog.

use super::action::{watch_status, ActionQueue, UiActionHandler};
use super::combine::{combine, Input, StateCell, TaskGuard};
use super::events::{OneShotEvents, SnackbarError, UiDestination};
use super::loading::LoadingCounter;
use crate::model::task::NewTask;
use crate::repo::task_repo::TaskRepository;
use crate::service::interactor::Interactor;
use crate::service::task_interactors::SaveNewTask;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskUiState {
    pub title: String,
    pub description: String,
    pub expires_on: Option<NaiveDate>,
    pub show_expiration_date_picker: bool,
    pub show_confirm_discard_changes_dialog: bool,
    pub loading: bool,
}

impl CreateTaskUiState {
    /// Returns whether the form differs from an empty one.
    pub fn should_confirm_discard_changes(&self) -> bool {
        !self.title.is_empty() || !self.description.is_empty() || self.expires_on.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateTaskUiAction {
    EditTitle(String),
    EditDescription(String),
    SetExpirationDate(NaiveDate),
    ClearExpirationDate,
    OpenExpirationDatePicker,
    DismissExpirationDatePicker,
    SaveTask,
    NavigateUp,
    CancelDiscardChanges,
    ConfirmDiscardChanges,
}

struct CreateTaskScreen {
    title: StateCell<String>,
    description: StateCell<String>,
    expires_on: StateCell<Option<NaiveDate>>,
    show_expiration_date_picker: StateCell<bool>,
    show_confirm_discard_changes_dialog: StateCell<bool>,
    save_new_task: SaveNewTask,
    loading: LoadingCounter,
    destinations: OneShotEvents<UiDestination>,
    snackbar_errors: OneShotEvents<SnackbarError>,
}

impl CreateTaskScreen {
    fn snapshot(&self) -> CreateTaskUiState {
        CreateTaskUiState {
            title: self.title.get(),
            description: self.description.get(),
            expires_on: self.expires_on.get(),
            show_expiration_date_picker: self.show_expiration_date_picker.get(),
            show_confirm_discard_changes_dialog: self.show_confirm_discard_changes_dialog.get(),
            loading: self.loading.is_loading(),
        }
    }

    fn inputs(&self) -> Vec<Box<dyn Input>> {
        vec![
            Box::new(self.title.observe()),
            Box::new(self.description.observe()),
            Box::new(self.expires_on.observe()),
            Box::new(self.show_expiration_date_picker.observe()),
            Box::new(self.show_confirm_discard_changes_dialog.observe()),
            Box::new(self.loading.observe()),
        ]
    }

    fn save(&self) {
        let state = self.snapshot();
        let new_task =
            NewTask::new(state.title, state.description).with_expiration(state.expires_on);

        let destinations = self.destinations.clone();
        watch_status(
            self.save_new_task.invoke(new_task),
            self.loading.clone(),
            self.snackbar_errors.clone(),
            SnackbarError::ErrorWhileSaving,
            Some(Box::new(move || {
                destinations.emit(UiDestination::Up);
            })),
        );
    }
}

#[async_trait]
impl UiActionHandler<CreateTaskUiAction> for CreateTaskScreen {
    async fn handle_ui_action(&self, action: CreateTaskUiAction) {
        match action {
            CreateTaskUiAction::EditTitle(title) => self.title.set(title),
            CreateTaskUiAction::EditDescription(description) => self.description.set(description),
            CreateTaskUiAction::SetExpirationDate(date) => {
                self.expires_on.set(Some(date));
                self.show_expiration_date_picker.set(false);
            }
            CreateTaskUiAction::ClearExpirationDate => self.expires_on.set(None),
            CreateTaskUiAction::OpenExpirationDatePicker => {
                self.show_expiration_date_picker.set(true);
            }
            CreateTaskUiAction::DismissExpirationDatePicker => {
                self.show_expiration_date_picker.set(false);
            }
            CreateTaskUiAction::SaveTask => self.save(),
            CreateTaskUiAction::NavigateUp => {
                if self.snapshot().should_confirm_discard_changes() {
                    self.show_confirm_discard_changes_dialog.set(true);
                } else {
                    self.destinations.emit(UiDestination::Up);
                }
            }
            CreateTaskUiAction::CancelDiscardChanges => {
                self.show_confirm_discard_changes_dialog.set(false);
            }
            CreateTaskUiAction::ConfirmDiscardChanges => {
                self.show_confirm_discard_changes_dialog.set(false);
                self.destinations.emit(UiDestination::Up);
            }
        }
    }
}

/// View model of the create-task form.
pub struct CreateTaskViewModel {
    screen: Arc<CreateTaskScreen>,
    ui_state: watch::Receiver<CreateTaskUiState>,
    actions: ActionQueue<CreateTaskUiAction>,
    _composer: TaskGuard,
}

impl CreateTaskViewModel {
    /// Must be called within a Tokio runtime.
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        let screen = Arc::new(CreateTaskScreen {
            title: StateCell::new(String::new()),
            description: StateCell::new(String::new()),
            expires_on: StateCell::new(None),
            show_expiration_date_picker: StateCell::new(false),
            show_confirm_discard_changes_dialog: StateCell::new(false),
            save_new_task: SaveNewTask::new(repo),
            loading: LoadingCounter::new(),
            destinations: OneShotEvents::new(),
            snackbar_errors: OneShotEvents::new(),
        });

        let projection = Arc::clone(&screen);
        let (ui_state, composer) = combine(screen.inputs(), move || projection.snapshot());
        let actions = ActionQueue::spawn("create_task", Arc::clone(&screen));

        Self {
            screen,
            ui_state,
            actions,
            _composer: composer,
        }
    }

    pub fn ui_state(&self) -> watch::Receiver<CreateTaskUiState> {
        self.ui_state.clone()
    }

    pub fn current_state(&self) -> CreateTaskUiState {
        self.screen.snapshot()
    }

    pub fn submit_ui_action(&self, action: CreateTaskUiAction) {
        self.actions.submit(action);
    }

    pub fn pending_destinations(&self) -> broadcast::Receiver<UiDestination> {
        self.screen.destinations.subscribe()
    }

    pub fn pending_snackbar_errors(&self) -> broadcast::Receiver<SnackbarError> {
        self.screen.snackbar_errors.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::CreateTaskUiState;
    use chrono::NaiveDate;

    #[test]
    fn empty_form_needs_no_discard_confirmation() {
        assert!(!CreateTaskUiState::default().should_confirm_discard_changes());
    }

    #[test]
    fn any_edited_field_needs_confirmation() {
        let titled = CreateTaskUiState {
            title: "a".to_string(),
            ..CreateTaskUiState::default()
        };
        let dated = CreateTaskUiState {
            expires_on: NaiveDate::from_ymd_opt(2026, 1, 2),
            ..CreateTaskUiState::default()
        };
        let flags_only = CreateTaskUiState {
            show_expiration_date_picker: true,
            loading: true,
            ..CreateTaskUiState::default()
        };

        assert!(titled.should_confirm_discard_changes());
        assert!(dated.should_confirm_discard_changes());
        assert!(!flags_only.should_confirm_discard_changes());
    }
}
