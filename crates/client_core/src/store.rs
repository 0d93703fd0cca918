use shared::{
    domain::{total_impact, Action, ActionId, ImpactSummary},
    protocol::ActionPayload,
};
use tracing::{debug, info};

use crate::{api::ActionsApi, error::NormalizedError, transport::ActionTransport};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub items: Vec<Action>,
    pub is_loading: bool,
    pub load_error: Option<String>,
}

/// Local copy of the remote collection. Mutations go to the server first and are
/// followed by a full reload, so `items` only ever holds what the server returned.
pub struct ActionStore<T> {
    api: ActionsApi<T>,
    state: StoreState,
}

impl<T: ActionTransport> ActionStore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            api: ActionsApi::new(transport),
            state: StoreState::default(),
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn items(&self) -> &[Action] {
        &self.state.items
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.state.load_error.as_deref()
    }

    pub fn find(&self, action_id: ActionId) -> Option<&Action> {
        self.state.items.iter().find(|action| action.id == action_id)
    }

    pub fn total_impact(&self) -> f64 {
        total_impact(&self.state.items)
    }

    pub fn impact(&self) -> ImpactSummary {
        ImpactSummary::from_actions(&self.state.items)
    }

    /// Replaces `items` with the server's collection. On failure the previous items stay
    /// and `load_error` carries the normalized message.
    pub async fn load(&mut self) -> Result<(), NormalizedError> {
        self.state.load_error = None;
        let result = {
            let _loading = LoadingFlag::raise(&mut self.state.is_loading);
            self.api.list().await
        };

        match result {
            Ok(items) => {
                debug!(count = items.len(), "actions loaded");
                self.state.items = items;
                Ok(())
            }
            Err(error) => {
                self.state.load_error = Some(error.message().to_string());
                Err(error)
            }
        }
    }

    pub async fn create(&mut self, payload: &ActionPayload) -> Result<Action, NormalizedError> {
        let created = self.api.create(payload).await?;
        info!(action_id = created.id.0, "action created");
        self.reload().await;
        Ok(created)
    }

    pub async fn update(
        &mut self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Action, NormalizedError> {
        let updated = self.api.update(action_id, payload).await?;
        info!(action_id = updated.id.0, "action updated");
        self.reload().await;
        Ok(updated)
    }

    pub async fn remove(&mut self, action_id: ActionId) -> Result<(), NormalizedError> {
        self.api.delete(action_id).await?;
        info!(action_id = action_id.0, "action deleted");
        self.reload().await;
        Ok(())
    }

    async fn reload(&mut self) {
        // The mutation already succeeded; a failed reload only shows up as `load_error`.
        if self.load().await.is_err() {
            debug!("reload after mutation failed");
        }
    }
}

/// Holds `is_loading` up until dropped, so a cancelled load clears it too.
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
