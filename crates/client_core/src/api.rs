use shared::{
    domain::{Action, ActionId},
    protocol::ActionPayload,
};
use tracing::warn;

use crate::{
    error::{normalize, NormalizedError},
    transport::{ActionTransport, TransportFailure},
};

/// A transport whose failures all come back as [`NormalizedError`].
pub struct ActionsApi<T> {
    transport: T,
}

impl<T: ActionTransport> ActionsApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<Vec<Action>, NormalizedError> {
        self.transport
            .list()
            .await
            .map_err(|failure| report("list", failure))
    }

    pub async fn create(&self, payload: &ActionPayload) -> Result<Action, NormalizedError> {
        self.transport
            .create(payload)
            .await
            .map_err(|failure| report("create", failure))
    }

    pub async fn update(
        &self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Action, NormalizedError> {
        self.transport
            .update(action_id, payload)
            .await
            .map_err(|failure| report("update", failure))
    }

    pub async fn delete(&self, action_id: ActionId) -> Result<(), NormalizedError> {
        self.transport
            .delete(action_id)
            .await
            .map_err(|failure| report("delete", failure))
    }
}

fn report(operation: &'static str, failure: TransportFailure) -> NormalizedError {
    let error = normalize(&failure);
    warn!(
        operation,
        kind = ?error.kind(),
        status = error.status(),
        error_message = error.message(),
        detail = %failure.detail,
        "api request failed"
    );
    error
}
