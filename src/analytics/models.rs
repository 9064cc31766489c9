use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::models::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub language_code: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub total_visits: u32,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();

        if name.is_empty() {
            self.user_id.to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub total_users: usize,
}
