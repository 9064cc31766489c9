use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    bank::models::{Difficulty, QuestionRecord},
    config::config::AppConfig,
};

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingCategory,
    SelectingDifficulty,
    AwaitingCount,
    AwaitingDuration,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    Cancelled,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub prompt: String,
    pub chosen: String,
    pub correct: String,
    pub is_correct: bool,
}

/// The question currently on screen: its prompt plus the answer options in
/// display order. An incoming tap is resolved against `options` by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub prompt: String,
    pub correct_answer: String,
    pub options: Vec<String>,
}

#[derive(Debug)]
pub struct Session {
    pub user: UserId,
    pub phase: Phase,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub pool: Option<Arc<Vec<QuestionRecord>>>,
    pub quiz_set: Vec<QuestionRecord>,
    pub requested_count: usize,
    pub duration: Option<Duration>,
    pub current_index: usize,
    pub presentation: Option<Presentation>,
    pub score: u32,
    pub answers: Vec<AnswerRecord>,
    pub started_at: Option<Instant>,
    pub last_activity: Instant,
}

impl Session {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            phase: Phase::SelectingCategory,
            category: None,
            difficulty: None,
            pool: None,
            quiz_set: Vec::new(),
            requested_count: 0,
            duration: None,
            current_index: 0,
            presentation: None,
            score: 0,
            answers: Vec::new(),
            started_at: None,
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }

    /// Answered count is the answer log length, keeping the two in lockstep.
    pub fn answered(&self) -> usize {
        self.answers.len()
    }
}

#[derive(Debug, Clone)]
pub struct ResultSummary {
    pub reason: FinishReason,
    pub score: u32,
    pub answered: u32,
    pub percentage: f64,
    pub elapsed: Duration,
    pub wrong: Vec<AnswerRecord>,
    pub omitted: usize,
}

impl ResultSummary {
    pub fn from_session(session: &Session, reason: FinishReason, wrong_cap: usize) -> Self {
        let answered = session.answered() as u32;
        let percentage = if answered > 0 {
            session.score as f64 / answered as f64 * 100.0
        } else {
            0.0
        };

        let mut wrong: Vec<AnswerRecord> = session
            .answers
            .iter()
            .filter(|a| !a.is_correct)
            .cloned()
            .collect();

        let omitted = wrong.len().saturating_sub(wrong_cap);
        wrong.truncate(wrong_cap);

        // Expiry callbacks run a beat after the deadline; never report more
        // time spent than was allotted.
        let mut elapsed = session
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or_default();
        if let Some(allotted) = session.duration {
            elapsed = elapsed.min(allotted);
        }

        Self {
            reason,
            score: session.score,
            answered,
            percentage,
            elapsed,
            wrong,
            omitted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_sessions: usize,
    pub session_timeout: Duration,
    pub min_duration_minutes: u64,
    pub max_duration_minutes: u64,
    pub max_question_count: usize,
    pub max_wrong_rendered: usize,
    pub admin_user_id: UserId,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_sessions: config.quiz.max_sessions,
            session_timeout: Duration::from_secs(config.quiz.session_timeout_secs),
            min_duration_minutes: config.quiz.min_duration_minutes,
            max_duration_minutes: config.quiz.max_duration_minutes,
            max_question_count: config.quiz.max_question_count,
            max_wrong_rendered: config.quiz.max_wrong_rendered,
            admin_user_id: config.chat.admin_user_id,
        }
    }
}
