use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use server_api::{
    action_route, actions_route, create_action, delete_action, list_actions, update_action,
    ApiContext,
};
use shared::{
    domain::{Action, ActionId},
    error::{ApiError, ErrorCode},
    protocol::ActionPayload,
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        let detail = format!("{error:#}");
        error!(
            %database_url,
            error = %detail,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), &settings.api_prefix);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, api_prefix = %settings.api_prefix, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
}

fn build_router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let collection = actions_route();
    let item = action_route();
    let actions = Router::new()
        .route(&collection, get(http_list_actions).post(http_create_action))
        .route(
            &format!("{collection}/"),
            get(http_list_actions).post(http_create_action),
        )
        .route(&item, put(http_update_action).delete(http_delete_action))
        .route(
            &format!("{item}/"),
            put(http_update_action).delete(http_delete_action),
        );

    let app = Router::new().route("/healthz", get(healthz));
    let app = if api_prefix.is_empty() {
        app.merge(actions)
    } else {
        app.nest(api_prefix, actions)
    };

    app.layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            let detail = format!("{error:#}");
            error!(error = %detail, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_actions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Action>>> {
    list_actions(&state.api).await.map(Json).map_err(reject)
}

async fn http_create_action(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ActionPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Action>)> {
    let Json(payload) = body.map_err(invalid_body)?;
    let action = create_action(&state.api, payload).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(action)))
}

async fn http_update_action(
    State(state): State<Arc<AppState>>,
    Path(action_id): Path<i64>,
    body: Result<Json<ActionPayload>, JsonRejection>,
) -> ApiResult<Json<Action>> {
    let Json(payload) = body.map_err(invalid_body)?;
    update_action(&state.api, ActionId(action_id), payload)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_delete_action(
    State(state): State<Arc<AppState>>,
    Path(action_id): Path<i64>,
) -> ApiResult<StatusCode> {
    delete_action(&state.api, ActionId(action_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

fn invalid_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    reject(ApiError::validation(rejection.body_text()))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
