use serde::{Deserialize, Serialize};

use crate::{bank::models::Difficulty, session::models::UserId};

/// Sender profile attached to inbound updates, used by the analytics ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone)]
pub enum InboundEvent {
    CategorySelected {
        user: UserId,
        category: String,
    },
    DifficultySelected {
        user: UserId,
        level: Difficulty,
    },
    TextReceived {
        user: UserId,
        from: Option<ChatUser>,
        text: String,
    },
    AnswerTapped {
        user: UserId,
        display_index: usize,
    },
    CancelRequested {
        user: UserId,
    },
}

impl InboundEvent {
    pub fn user(&self) -> UserId {
        match self {
            InboundEvent::CategorySelected { user, .. }
            | InboundEvent::DifficultySelected { user, .. }
            | InboundEvent::TextReceived { user, .. }
            | InboundEvent::AnswerTapped { user, .. }
            | InboundEvent::CancelRequested { user } => *user,
        }
    }
}

/// One question as handed to the transport: prompt, options in display
/// order, and the 1-based position within the quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub prompt: String,
    pub options: Vec<String>,
    pub number: usize,
    pub total: usize,
}
