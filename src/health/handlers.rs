use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
};
use reqwest::StatusCode;

use crate::{
    common::{app_state::AppState, error::ServerError},
    config::config::CONFIG,
};

static ADMIN_KEY_HEADER: &str = "X-Admin-Key";

pub fn health_routes(state: Arc<AppState>) -> Router {
    Router::new().route("/", get(health)).with_state(state)
}

pub fn status_routes(state: Arc<AppState>) -> Router {
    Router::new().route("/status", get(status)).with_state(state)
}

async fn health() -> impl IntoResponse {
    "OK".into_response()
}

/// Read-only administrative snapshot, guarded by the configured admin key.
async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServerError> {
    let key = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if key != Some(CONFIG.server.admin_key.as_str()) {
        return Err(ServerError::Api(
            StatusCode::UNAUTHORIZED,
            "Invalid admin key".into(),
        ));
    }

    let snapshot = state.engine().snapshot().await;
    Ok((StatusCode::OK, Json(snapshot)))
}
