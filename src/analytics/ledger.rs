use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::{
    analytics::models::{LedgerFile, UserProfile},
    session::models::UserId,
    transport::models::ChatUser,
};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Failed to write user ledger: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize user ledger: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Sidecar record of who used the bot and when. Has no bearing on quiz
/// correctness; callers log failures and carry on.
pub struct UserLedger {
    path: PathBuf,
    file: Mutex<LedgerFile>,
}

impl UserLedger {
    /// A missing or unreadable ledger file degrades to an empty ledger.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let file = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<LedgerFile>(&raw) {
                Ok(file) => file,
                Err(e) => {
                    error!("Invalid user ledger at {}: {}", path.display(), e);
                    LedgerFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerFile::default(),
            Err(e) => {
                error!("Failed to read user ledger at {}: {}", path.display(), e);
                LedgerFile::default()
            }
        };

        info!("Loaded {} known users", file.users.len());
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    pub async fn record_visit(
        &self,
        user: UserId,
        info: Option<&ChatUser>,
    ) -> Result<(), LedgerError> {
        let mut file = self.file.lock().await;
        let now = Utc::now();

        match file.users.iter().position(|u| u.user_id == user) {
            Some(existing) => {
                let profile = &mut file.users[existing];

                if let Some(info) = info {
                    profile.first_name = info.first_name.clone().unwrap_or_default();
                    profile.last_name = info.last_name.clone().unwrap_or_default();
                    profile.username = info.username.clone().unwrap_or_default();
                    profile.language_code = info.language_code.clone().unwrap_or_default();
                }
                profile.last_seen = now;
                profile.total_visits += 1;
            }
            None => {
                file.users.push(UserProfile {
                    user_id: user,
                    first_name: info
                        .and_then(|i| i.first_name.clone())
                        .unwrap_or_default(),
                    last_name: info.and_then(|i| i.last_name.clone()).unwrap_or_default(),
                    username: info.and_then(|i| i.username.clone()).unwrap_or_default(),
                    language_code: info
                        .and_then(|i| i.language_code.clone())
                        .unwrap_or_default(),
                    first_seen: now,
                    last_seen: now,
                    total_visits: 1,
                });
            }
        }

        file.total_users = file.users.len();
        self.save(&file).await
    }

    pub async fn total_users(&self) -> usize {
        self.file.lock().await.total_users
    }

    /// Most recently seen users first.
    pub async fn recent(&self, limit: usize) -> Vec<UserProfile> {
        let file = self.file.lock().await;

        let mut users: Vec<UserProfile> = file.users.clone();
        users.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        users.truncate(limit);
        users
    }

    async fn save(&self, file: &LedgerFile) -> Result<(), LedgerError> {
        let raw = serde_json::to_string_pretty(file)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}
