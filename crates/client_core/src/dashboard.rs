use chrono::Utc;
use shared::domain::{Action, ActionId, ImpactSummary};
use tracing::info;

use crate::{
    config::ClientSettings,
    edit_session::{EditSession, FormValues, SubmitOutcome},
    error::NormalizedError,
    notifications::{CloseReason, Notification, NotificationQueue, Severity},
    store::ActionStore,
    transport::{ActionTransport, HttpTransport},
};

pub const CREATED_MESSAGE: &str = "Action created successfully";
pub const UPDATED_MESSAGE: &str = "Action updated successfully";
pub const DELETED_MESSAGE: &str = "Action deleted successfully";
pub const LOAD_FAILED_MESSAGE: &str = "Error fetching actions";
pub const SAVE_FAILED_MESSAGE: &str = "Error saving action";
pub const DELETE_FAILED_MESSAGE: &str = "Error deleting action";

/// What the presentation layer should draw right now.
#[derive(Debug, PartialEq)]
pub enum DashboardView<'a> {
    /// The last load failed; the message replaces the (possibly stale) list.
    Failed { message: &'a str },
    Loading,
    Ready {
        actions: &'a [Action],
        impact: ImpactSummary,
        editing: Option<&'a Action>,
        notification: Option<&'a Notification>,
    },
}

/// State for one UI session: the store, the edit form and the notification slot.
pub struct Dashboard<T> {
    store: ActionStore<T>,
    session: EditSession,
    notifications: NotificationQueue,
}

impl Dashboard<HttpTransport> {
    pub fn connect(settings: ClientSettings) -> anyhow::Result<Self> {
        info!(base_url = %settings.base_url(), "connecting dashboard");
        Ok(Self::new(HttpTransport::new(settings)?))
    }
}

impl<T: ActionTransport> Dashboard<T> {
    pub fn new(transport: T) -> Self {
        Self {
            store: ActionStore::new(transport),
            session: EditSession::new(),
            notifications: NotificationQueue::new(),
        }
    }

    pub fn store(&self) -> &ActionStore<T> {
        &self.store
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub async fn mount(&mut self) -> Result<(), NormalizedError> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<(), NormalizedError> {
        let result = self.store.load().await;
        if result.is_err() {
            self.notifications.error(LOAD_FAILED_MESSAGE);
        }
        result
    }

    pub fn edit(&mut self, action: Action) -> FormValues {
        self.session.begin_edit(action)
    }

    pub fn cancel_edit(&mut self) {
        self.session.cancel();
    }

    /// Initial values for the form as it should currently be shown.
    pub fn form_values(&self) -> FormValues {
        self.session.initial_values(Utc::now().date_naive())
    }

    pub async fn submit(&mut self, values: &FormValues) -> Result<SubmitOutcome, NormalizedError> {
        match self.session.submit(&mut self.store, values).await {
            Ok(outcome) => {
                let message = match &outcome {
                    SubmitOutcome::Created(_) => CREATED_MESSAGE,
                    SubmitOutcome::Updated(_) => UPDATED_MESSAGE,
                };
                self.notifications.success(message);
                self.flag_stale_list();
                Ok(outcome)
            }
            Err(error) => {
                self.notifications
                    .error(error.server_message().unwrap_or(SAVE_FAILED_MESSAGE));
                Err(error)
            }
        }
    }

    pub async fn delete(&mut self, action_id: ActionId) -> Result<(), NormalizedError> {
        match self.store.remove(action_id).await {
            Ok(()) => {
                if self.session.target().is_some_and(|target| target.id == action_id) {
                    self.session.cancel();
                }
                self.notifications.success(DELETED_MESSAGE);
                self.flag_stale_list();
                Ok(())
            }
            Err(error) => {
                self.notifications
                    .error(error.server_message().unwrap_or(DELETE_FAILED_MESSAGE));
                Err(error)
            }
        }
    }

    /// The reload after a mutation failed; its error replaces the success message.
    fn flag_stale_list(&mut self) {
        if self.store.load_error().is_some() {
            self.notifications.error(LOAD_FAILED_MESSAGE);
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notifications.notify(message, severity);
    }

    pub fn dismiss(&mut self) {
        self.notifications.dismiss();
    }

    pub fn close_notification(&mut self, reason: CloseReason) -> bool {
        self.notifications.close(reason)
    }

    pub fn view(&self) -> DashboardView<'_> {
        if let Some(message) = self.store.load_error() {
            return DashboardView::Failed { message };
        }
        if self.store.is_loading() {
            return DashboardView::Loading;
        }
        DashboardView::Ready {
            actions: self.store.items(),
            impact: self.store.impact(),
            editing: self.session.target(),
            notification: self.notifications.visible(),
        }
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
