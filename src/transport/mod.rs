pub mod models;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    session::models::{ResultSummary, UserId},
    transport::models::QuestionView,
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat api error: {0} - {1}")]
    Api(StatusCode, String),
}

/// Outbound side of the chat collaborator. Every call may fail; the engine
/// treats a failure mid-interaction as fatal for that session.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn present_categories(
        &self,
        user: UserId,
        categories: &[String],
    ) -> Result<(), TransportError>;

    async fn present_difficulties(&self, user: UserId, category: &str)
    -> Result<(), TransportError>;

    async fn present_question(
        &self,
        user: UserId,
        question: &QuestionView,
    ) -> Result<(), TransportError>;

    async fn present_result(
        &self,
        user: UserId,
        summary: &ResultSummary,
    ) -> Result<(), TransportError>;

    async fn present_notice(&self, user: UserId, text: &str) -> Result<(), TransportError>;

    async fn present_error(&self, user: UserId, message: &str) -> Result<(), TransportError>;
}
