use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::error;

use crate::{
    bank::models::Difficulty,
    session::models::{FinishReason, ResultSummary, UserId},
    transport::{Transport, TransportError, models::QuestionView},
};

const PROMPT_PREVIEW_CHARS: usize = 100;

/// Outbound chat transport: renders presentations as messages with inline
/// keyboards and posts them to the configured chat send API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_base: String,
    token: String,
    client: Client,
}

impl ChatClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            client,
        }
    }

    async fn send_message(
        &self,
        user: UserId,
        text: &str,
        keyboard: Option<Value>,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": user,
            "text": text,
        });

        if let Some(keyboard) = keyboard {
            body["reply_markup"] = json!({ "inline_keyboard": keyboard });
        }

        let url = format!("{}/sendMessage", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or("No body".into());
            error!("Chat send to user {} failed: {} - {}", user, status, body);
            return Err(TransportError::Api(status, body));
        }

        Ok(())
    }

    fn render_result(summary: &ResultSummary) -> String {
        let heading = match summary.reason {
            FinishReason::Completed => "Test finished!",
            FinishReason::TimedOut => "Time is up!",
            FinishReason::Cancelled => "Test cancelled.",
        };

        let minutes = summary.elapsed.as_secs() / 60;
        let seconds = summary.elapsed.as_secs() % 60;

        let mut text = format!(
            "{}\n\nResults:\nCorrect: {}/{} ({:.1}%)\nTime spent: {}m {}s\n\n",
            heading, summary.score, summary.answered, summary.percentage, minutes, seconds
        );

        if summary.wrong.is_empty() && summary.omitted == 0 {
            text.push_str("Perfect score! No wrong answers!\n");
            return text;
        }

        text.push_str("Wrong answers:\n\n");
        for (i, wrong) in summary.wrong.iter().enumerate() {
            let prompt: String = wrong.prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
            let ellipsis = if wrong.prompt.chars().count() > PROMPT_PREVIEW_CHARS {
                "..."
            } else {
                ""
            };

            text.push_str(&format!(
                "{}. Q: {}{}\n   Your answer: {}\n   Correct answer: {}\n\n",
                i + 1,
                prompt,
                ellipsis,
                wrong.chosen,
                wrong.correct
            ));
        }

        if summary.omitted > 0 {
            text.push_str(&format!("... and {} more wrong answers\n", summary.omitted));
        }

        text
    }
}

#[async_trait]
impl Transport for ChatClient {
    async fn present_categories(
        &self,
        user: UserId,
        categories: &[String],
    ) -> Result<(), TransportError> {
        let keyboard: Vec<Value> = categories
            .iter()
            .map(|category| {
                json!([{ "text": category, "callback_data": format!("cat_{}", category) }])
            })
            .collect();

        self.send_message(user, "Choose a category:", Some(json!(keyboard)))
            .await
    }

    async fn present_difficulties(
        &self,
        user: UserId,
        category: &str,
    ) -> Result<(), TransportError> {
        let keyboard: Vec<Value> = Difficulty::all()
            .iter()
            .map(|level| {
                json!([{
                    "text": format!("Difficulty {}", level),
                    "callback_data": format!("diff_{}", level),
                }])
            })
            .collect();

        let text = format!("Category: {}\nChoose difficulty:", category);
        self.send_message(user, &text, Some(json!(keyboard))).await
    }

    async fn present_question(
        &self,
        user: UserId,
        question: &QuestionView,
    ) -> Result<(), TransportError> {
        let mut keyboard: Vec<Value> = question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                json!([{ "text": option, "callback_data": format!("ans_{}", i) }])
            })
            .collect();
        keyboard.push(json!([{ "text": "Cancel test", "callback_data": "cancel_test" }]));

        let text = format!(
            "Question {}/{}:\n\n{}",
            question.number, question.total, question.prompt
        );
        self.send_message(user, &text, Some(json!(keyboard))).await
    }

    async fn present_result(
        &self,
        user: UserId,
        summary: &ResultSummary,
    ) -> Result<(), TransportError> {
        let keyboard = json!([[{ "text": "Take another test", "callback_data": "restart" }]]);
        self.send_message(user, &Self::render_result(summary), Some(keyboard))
            .await
    }

    async fn present_notice(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        self.send_message(user, text, None).await
    }

    async fn present_error(&self, user: UserId, message: &str) -> Result<(), TransportError> {
        self.send_message(user, message, None).await
    }
}
