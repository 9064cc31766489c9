use axum::{
    Json,
    response::{IntoResponse, Response},
};
use reqwest::StatusCode;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Api error: {0} - {1}")]
    Api(StatusCode, String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let ServerError::Api(status, message) = self;
        error!("Request failed: {} - {}", status, message);

        (status, Json(json!({ "error": message }))).into_response()
    }
}
