use shared::{
    domain::{Action, ActionId},
    error::ApiError,
    protocol::{ActionPayload, ACTIONS_COLLECTION},
};
use storage::Storage;
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub fn actions_route() -> String {
    format!("/{ACTIONS_COLLECTION}")
}

pub fn action_route() -> String {
    format!("/{ACTIONS_COLLECTION}/:action_id")
}

pub async fn list_actions(ctx: &ApiContext) -> Result<Vec<Action>, ApiError> {
    ctx.storage.list_actions().await.map_err(internal)
}

pub async fn create_action(ctx: &ApiContext, payload: ActionPayload) -> Result<Action, ApiError> {
    let payload = validate(payload)?;
    let action = ctx
        .storage
        .create_action(&payload)
        .await
        .map_err(internal)?;
    info!(action_id = action.id.0, points = action.points, "action created");
    Ok(action)
}

pub async fn update_action(
    ctx: &ApiContext,
    action_id: ActionId,
    payload: ActionPayload,
) -> Result<Action, ApiError> {
    let payload = validate(payload)?;
    let action = ctx
        .storage
        .update_action(action_id, &payload)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(action_id))?;
    info!(action_id = action.id.0, "action updated");
    Ok(action)
}

pub async fn delete_action(ctx: &ApiContext, action_id: ActionId) -> Result<(), ApiError> {
    let removed = ctx
        .storage
        .delete_action(action_id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err(not_found(action_id));
    }
    info!(action_id = action_id.0, "action deleted");
    Ok(())
}

fn validate(mut payload: ActionPayload) -> Result<ActionPayload, ApiError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::validation("description must not be empty"));
    }
    if !payload.points.is_finite() {
        return Err(ApiError::validation("points must be a finite number"));
    }
    payload.description = description.to_string();
    Ok(payload)
}

fn not_found(action_id: ActionId) -> ApiError {
    ApiError::not_found(format!("action {action_id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    let detail = format!("{err:#}");
    error!(error = %detail, "storage failure");
    ApiError::internal(err.to_string())
}
