use serde::Deserialize;

use crate::{
    bank::models::Difficulty,
    transport::models::{ChatUser, InboundEvent},
};

/// One inbound chat update: a free-text message or an inline-keyboard tap.
#[derive(Debug, Deserialize)]
pub struct ChatUpdate {
    pub from: ChatUser,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback: Option<CallbackTap>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackTap {
    pub data: String,
}

impl ChatUpdate {
    /// Maps the wire-level callback tokens (`cat_*`, `diff_*`, `ans_*`,
    /// `cancel_test`, `restart`) and plain text onto engine events. Returns
    /// `None` for anything unrecognized.
    pub fn into_event(self) -> Option<InboundEvent> {
        let user = self.from.id;

        if let Some(callback) = self.callback {
            let data = callback.data;

            if let Some(category) = data.strip_prefix("cat_") {
                return Some(InboundEvent::CategorySelected {
                    user,
                    category: category.to_string(),
                });
            }

            if let Some(level) = data.strip_prefix("diff_") {
                let level = Difficulty::try_from(level).ok()?;
                return Some(InboundEvent::DifficultySelected { user, level });
            }

            if let Some(index) = data.strip_prefix("ans_") {
                let display_index = index.parse().ok()?;
                return Some(InboundEvent::AnswerTapped {
                    user,
                    display_index,
                });
            }

            return match data.as_str() {
                "cancel_test" => Some(InboundEvent::CancelRequested { user }),
                // A restart tap re-enters the /start flow.
                "restart" => Some(InboundEvent::TextReceived {
                    user,
                    from: Some(self.from),
                    text: "/start".to_string(),
                }),
                _ => None,
            };
        }

        if let Some(message) = self.message {
            return Some(InboundEvent::TextReceived {
                user,
                from: Some(self.from),
                text: message.text,
            });
        }

        None
    }
}
