use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    analytics::ledger::UserLedger,
    bank::{
        loader::QuestionBank,
        models::{Difficulty, QuestionRecord},
    },
    session::{
        engine::QuizEngine,
        models::{EngineSettings, ResultSummary, UserId},
    },
    transport::{
        Transport, TransportError,
        models::{InboundEvent, QuestionView},
    },
};

pub const ADMIN: UserId = 999;

#[derive(Debug, Clone)]
pub enum Outbound {
    Categories(Vec<String>),
    Difficulties(String),
    Question(QuestionView),
    Result(ResultSummary),
    Notice(String),
    Error(String),
}

/// Records everything the engine sends; can be switched into a failing mode
/// to exercise the transport-failure teardown path.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<Outbound>>,
    pub fail_all: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, outbound: Outbound) -> Result<(), TransportError> {
        if self.fail_all.load(Ordering::Relaxed) {
            return Err(TransportError::Api(
                StatusCode::BAD_GATEWAY,
                "forced failure".into(),
            ));
        }

        self.sent.lock().unwrap().push(outbound);
        Ok(())
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    pub fn results(&self) -> Vec<ResultSummary> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Result(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }

    pub fn questions(&self) -> Vec<QuestionView> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Question(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    pub fn last_question(&self) -> Option<QuestionView> {
        self.questions().pop()
    }

    pub fn errors(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Notice(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn present_categories(
        &self,
        _user: UserId,
        categories: &[String],
    ) -> Result<(), TransportError> {
        self.push(Outbound::Categories(categories.to_vec()))
    }

    async fn present_difficulties(
        &self,
        _user: UserId,
        category: &str,
    ) -> Result<(), TransportError> {
        self.push(Outbound::Difficulties(category.to_string()))
    }

    async fn present_question(
        &self,
        _user: UserId,
        question: &QuestionView,
    ) -> Result<(), TransportError> {
        self.push(Outbound::Question(question.clone()))
    }

    async fn present_result(
        &self,
        _user: UserId,
        summary: &ResultSummary,
    ) -> Result<(), TransportError> {
        self.push(Outbound::Result(summary.clone()))
    }

    async fn present_notice(&self, _user: UserId, text: &str) -> Result<(), TransportError> {
        self.push(Outbound::Notice(text.to_string()))
    }

    async fn present_error(&self, _user: UserId, message: &str) -> Result<(), TransportError> {
        self.push(Outbound::Error(message.to_string()))
    }
}

pub fn sample_questions(count: usize) -> Vec<QuestionRecord> {
    (0..count)
        .map(|i| QuestionRecord {
            prompt: format!("Question {}", i),
            correct_answer: format!("Right {}", i),
            distractors: [
                format!("Wrong {}a", i),
                format!("Wrong {}b", i),
                format!("Wrong {}c", i),
            ],
        })
        .collect()
}

pub fn sample_bank(category: &str, difficulty: Difficulty, count: usize) -> QuestionBank {
    let mut bank = QuestionBank::empty();
    bank.insert(category, difficulty, sample_questions(count));
    bank
}

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        max_sessions: 100,
        session_timeout: Duration::from_secs(3600),
        min_duration_minutes: 1,
        max_duration_minutes: 120,
        max_question_count: 200,
        max_wrong_rendered: 10,
        admin_user_id: ADMIN,
    }
}

pub fn ledger_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("quizline-test-users-{}.json", uuid::Uuid::new_v4()))
}

pub async fn test_engine(
    bank: QuestionBank,
    settings: EngineSettings,
) -> (Arc<QuizEngine>, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let ledger = Arc::new(UserLedger::load(ledger_path()).await);
    let engine = QuizEngine::new(bank, transport.clone(), ledger, settings);

    (engine, transport)
}

pub async fn send_text(engine: &Arc<QuizEngine>, user: UserId, text: &str) {
    engine
        .handle(InboundEvent::TextReceived {
            user,
            from: None,
            text: text.to_string(),
        })
        .await
        .unwrap();
}

/// Drives a user from /start all the way into a running quiz.
pub async fn start_quiz(
    engine: &Arc<QuizEngine>,
    user: UserId,
    category: &str,
    level: Difficulty,
    count: usize,
    minutes: u64,
) {
    send_text(engine, user, "/start").await;
    engine
        .handle(InboundEvent::CategorySelected {
            user,
            category: category.to_string(),
        })
        .await
        .unwrap();
    engine
        .handle(InboundEvent::DifficultySelected { user, level })
        .await
        .unwrap();
    send_text(engine, user, &count.to_string()).await;
    send_text(engine, user, &minutes.to_string()).await;
}

pub async fn answer(engine: &Arc<QuizEngine>, user: UserId, display_index: usize) {
    engine
        .handle(InboundEvent::AnswerTapped {
            user,
            display_index,
        })
        .await
        .unwrap();
}

/// Display index of the correct option in the most recent question.
pub fn correct_index(transport: &MockTransport) -> usize {
    let view = transport.last_question().expect("no question presented");
    view.options
        .iter()
        .position(|o| o.starts_with("Right"))
        .expect("no correct option in presentation")
}

pub fn wrong_index(transport: &MockTransport) -> usize {
    let view = transport.last_question().expect("no question presented");
    view.options
        .iter()
        .position(|o| o.starts_with("Wrong"))
        .expect("no wrong option in presentation")
}

/// Lets spawned tasks run to completion on the test runtime.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
