use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::load().unwrap_or_else(|e| panic!("Failed to load configuration: {}", e))
});

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub quiz: QuizConfig,
    pub bank: BankConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub admin_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub api_base: String,
    pub token: String,
    pub webhook_key: String,
    pub admin_user_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuizConfig {
    pub max_sessions: usize,
    pub session_timeout_secs: u64,
    pub reap_interval_secs: u64,
    pub min_duration_minutes: u64,
    pub max_duration_minutes: u64,
    pub max_question_count: usize,
    pub max_wrong_rendered: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BankConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    pub path: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.address", "0.0.0.0")?
            .set_default("server.port", 8080i64)?
            .set_default("server.admin_key", "")?
            .set_default("chat.api_base", "")?
            .set_default("chat.token", "")?
            .set_default("chat.webhook_key", "")?
            .set_default("chat.admin_user_id", 0i64)?
            .set_default("quiz.max_sessions", 1000i64)?
            .set_default("quiz.session_timeout_secs", 3600i64)?
            .set_default("quiz.reap_interval_secs", 600i64)?
            .set_default("quiz.min_duration_minutes", 1i64)?
            .set_default("quiz.max_duration_minutes", 120i64)?
            .set_default("quiz.max_question_count", 200i64)?
            .set_default("quiz.max_wrong_rendered", 10i64)?
            .set_default("bank.path", "questions.json")?
            .set_default("analytics.path", "users.json")?
            .add_source(File::with_name("quizline").required(false))
            .add_source(Environment::with_prefix("QUIZLINE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
