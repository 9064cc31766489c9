use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::{
    common::{app_state::AppState, error::ServerError},
    config::config::CONFIG,
    session::engine::EngineError,
    webhook::models::ChatUpdate,
};

static WEBHOOK_KEY_HEADER: &str = "X-Webhook-Key";

pub fn webhook_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(receive_update))
        .with_state(state)
}

async fn receive_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<ChatUpdate>,
) -> Result<impl IntoResponse, ServerError> {
    let key = headers
        .get(WEBHOOK_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if key != Some(CONFIG.chat.webhook_key.as_str()) {
        return Err(ServerError::Api(
            StatusCode::UNAUTHORIZED,
            "Invalid webhook key".into(),
        ));
    }

    let Some(event) = update.into_event() else {
        debug!("Dropping unrecognized update");
        return Ok(StatusCode::OK);
    };

    let user = event.user();
    match state.engine().handle(event).await {
        Ok(()) => {}
        Err(EngineError::Validation(reason)) => {
            debug!("Rejected input from user {}: {}", user, reason)
        }
        Err(e) => warn!("Engine error for user {}: {}", user, e),
    }

    // The engine has already notified the user; the chat platform only
    // needs acknowledgement.
    Ok(StatusCode::OK)
}
