use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use rand::{
    SeedableRng,
    seq::{IndexedRandom, SliceRandom},
};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    analytics::ledger::UserLedger,
    bank::{loader::QuestionBank, models::Difficulty},
    session::{
        models::{
            AnswerRecord, EngineSettings, FinishReason, Phase, Presentation, ResultSummary,
            Session, UserId,
        },
        store::SessionStore,
        timer::TimerSupervisor,
    },
    transport::{
        Transport, TransportError,
        models::{ChatUser, InboundEvent, QuestionView},
    },
};

static CAPACITY_MSG: &str = "Bot is currently at capacity. Please try again later.";
static EXPIRED_MSG: &str = "Session expired. Please start over with /start";
static NOT_FOUND_MSG: &str = "Category or difficulty not found. Please start over with /start";
static CANCELLED_MSG: &str = "Quiz cancelled. Send /start to begin a new one.";
static NOT_A_NUMBER_MSG: &str = "Please send a number";

const USERS_LISTED: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Bot is at session capacity")]
    CapacityExceeded,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No questions for category '{0}' at difficulty {1}")]
    NotFound(String, Difficulty),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineSnapshot {
    pub active_sessions: usize,
    pub active_timers: usize,
    pub categories_loaded: usize,
    pub total_users: usize,
}

enum DifficultyOutcome {
    Stale,
    NotFound(String),
    Ready(usize),
}

enum CountOutcome {
    Stale,
    OutOfRange(usize),
    Accepted,
}

enum StartOutcome {
    Stale,
    Started(QuestionView),
}

enum Advance {
    Stale,
    Next(QuestionView),
    Done,
}

/// The per-user state machine. Inbound events mutate sessions under the
/// store's per-key lock; all transport I/O happens after the lock is
/// released. The timer supervisor and the reaper finalize sessions through
/// the same `finish`/teardown path the engine uses.
pub struct QuizEngine {
    bank: QuestionBank,
    store: Arc<SessionStore>,
    timers: Arc<TimerSupervisor>,
    transport: Arc<dyn Transport>,
    ledger: Arc<UserLedger>,
    settings: EngineSettings,
}

impl QuizEngine {
    pub fn new(
        bank: QuestionBank,
        transport: Arc<dyn Transport>,
        ledger: Arc<UserLedger>,
        settings: EngineSettings,
    ) -> Arc<Self> {
        let timers = Arc::new(TimerSupervisor::new());
        let store = Arc::new(SessionStore::new(
            Arc::clone(&timers),
            settings.max_sessions,
            settings.session_timeout,
        ));

        Arc::new(Self {
            bank,
            store,
            timers,
            transport,
            ledger,
            settings,
        })
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        let store = self.store.snapshot();

        EngineSnapshot {
            active_sessions: store.sessions,
            active_timers: store.timers,
            categories_loaded: self.bank.category_count(),
            total_users: self.ledger.total_users().await,
        }
    }

    pub async fn handle(self: &Arc<Self>, event: InboundEvent) -> Result<(), EngineError> {
        match event {
            InboundEvent::TextReceived { user, from, text } => {
                self.on_text(user, from.as_ref(), &text).await
            }
            InboundEvent::CategorySelected { user, category } => {
                self.on_category(user, category).await
            }
            InboundEvent::DifficultySelected { user, level } => {
                self.on_difficulty(user, level).await
            }
            InboundEvent::AnswerTapped {
                user,
                display_index,
            } => self.on_answer(user, display_index).await,
            InboundEvent::CancelRequested { user } => {
                self.finish(user, FinishReason::Cancelled).await
            }
        }
    }

    /* Selection flow */

    async fn on_text(
        self: &Arc<Self>,
        user: UserId,
        from: Option<&ChatUser>,
        text: &str,
    ) -> Result<(), EngineError> {
        let text = text.trim();

        match text {
            "/start" => return self.on_start(user, from).await,
            "/help" => return self.on_help(user).await,
            "/stats" => return self.on_stats(user).await,
            "/users" => return self.on_users(user).await,
            _ => {}
        }

        match self.store.with_session(user, |session| session.phase) {
            Some(Phase::AwaitingCount) => self.on_count_reply(user, text).await,
            Some(Phase::AwaitingDuration) => self.on_duration_reply(user, text).await,
            _ => {
                debug!("Ignoring text from user {} outside numeric phases", user);
                Ok(())
            }
        }
    }

    async fn on_start(
        self: &Arc<Self>,
        user: UserId,
        from: Option<&ChatUser>,
    ) -> Result<(), EngineError> {
        if let Err(e) = self.ledger.record_visit(user, from).await {
            warn!("Failed to record visit for user {}: {}", user, e);
        }

        if !self.store.admit(user) {
            self.transport.present_error(user, CAPACITY_MSG).await?;
            return Err(EngineError::CapacityExceeded);
        }

        // A fresh start always replaces whatever the user had before.
        self.store.put(user, Session::new(user));
        info!("User {} started quiz selection", user);

        if let Err(e) = self
            .transport
            .present_categories(user, self.bank.categories())
            .await
        {
            self.fail_session(user, &e);
            return Err(e.into());
        }

        Ok(())
    }

    async fn on_category(
        self: &Arc<Self>,
        user: UserId,
        category: String,
    ) -> Result<(), EngineError> {
        if !self.store.admit(user) {
            self.transport.present_error(user, CAPACITY_MSG).await?;
            return Err(EngineError::CapacityExceeded);
        }

        let mut session = Session::new(user);
        session.category = Some(category.clone());
        session.phase = Phase::SelectingDifficulty;
        self.store.put(user, session);

        if let Err(e) = self.transport.present_difficulties(user, &category).await {
            self.fail_session(user, &e);
            return Err(e.into());
        }

        Ok(())
    }

    async fn on_difficulty(
        self: &Arc<Self>,
        user: UserId,
        level: Difficulty,
    ) -> Result<(), EngineError> {
        let outcome = self.store.with_session_mut(user, |session| {
            if session.phase != Phase::SelectingDifficulty {
                return DifficultyOutcome::Stale;
            }

            session.touch();
            let category = session.category.clone().unwrap_or_default();

            match self.bank.lookup(&category, level) {
                Some(pool) if !pool.is_empty() => {
                    let available = pool.len();
                    session.difficulty = Some(level);
                    session.pool = Some(pool);
                    session.phase = Phase::AwaitingCount;
                    DifficultyOutcome::Ready(available)
                }
                _ => DifficultyOutcome::NotFound(category),
            }
        });

        match outcome {
            None => {
                self.transport.present_error(user, EXPIRED_MSG).await?;
                Ok(())
            }
            Some(DifficultyOutcome::Stale) => {
                debug!("Stale difficulty pick from user {}", user);
                Ok(())
            }
            Some(DifficultyOutcome::NotFound(category)) => {
                self.store.teardown(user);
                self.transport.present_error(user, NOT_FOUND_MSG).await?;
                Err(EngineError::NotFound(category, level))
            }
            Some(DifficultyOutcome::Ready(available)) => {
                let prompt = format!(
                    "Available questions: {}\nHow many do you want to solve? (send a number)",
                    available
                );

                if let Err(e) = self.transport.present_notice(user, &prompt).await {
                    self.fail_session(user, &e);
                    return Err(e.into());
                }

                Ok(())
            }
        }
    }

    async fn on_count_reply(self: &Arc<Self>, user: UserId, text: &str) -> Result<(), EngineError> {
        let Ok(count) = text.parse::<usize>() else {
            self.transport.present_error(user, NOT_A_NUMBER_MSG).await?;
            return Err(EngineError::Validation(format!("not a number: '{}'", text)));
        };

        let outcome = self.store.with_session_mut(user, |session| {
            if session.phase != Phase::AwaitingCount {
                return CountOutcome::Stale;
            }

            session.touch();
            let available = session.pool.as_ref().map(|p| p.len()).unwrap_or(0);
            let max = available.min(self.settings.max_question_count);

            if count < 1 || count > max {
                return CountOutcome::OutOfRange(max);
            }

            session.requested_count = count;
            session.phase = Phase::AwaitingDuration;
            CountOutcome::Accepted
        });

        match outcome {
            None | Some(CountOutcome::Stale) => {
                debug!("Stale count reply from user {}", user);
                Ok(())
            }
            Some(CountOutcome::OutOfRange(max)) => {
                let message = format!("Must be between 1 and {}", max);
                self.transport.present_error(user, &message).await?;
                Err(EngineError::Validation(format!(
                    "question count {} out of range 1..={}",
                    count, max
                )))
            }
            Some(CountOutcome::Accepted) => {
                if let Err(e) = self
                    .transport
                    .present_notice(
                        user,
                        "How many minutes do you want for this test? (send a number)",
                    )
                    .await
                {
                    self.fail_session(user, &e);
                    return Err(e.into());
                }

                Ok(())
            }
        }
    }

    async fn on_duration_reply(
        self: &Arc<Self>,
        user: UserId,
        text: &str,
    ) -> Result<(), EngineError> {
        let Ok(minutes) = text.parse::<u64>() else {
            self.transport.present_error(user, NOT_A_NUMBER_MSG).await?;
            return Err(EngineError::Validation(format!("not a number: '{}'", text)));
        };

        let min = self.settings.min_duration_minutes;
        let max = self.settings.max_duration_minutes;
        if minutes < min || minutes > max {
            let message = format!("Timer must be between {} and {} minutes", min, max);
            self.transport.present_error(user, &message).await?;
            return Err(EngineError::Validation(format!(
                "duration {} out of range {}..={} minutes",
                minutes, min, max
            )));
        }

        let duration = Duration::from_secs(minutes * 60);

        let outcome = self.store.with_session_mut(user, |session| {
            if session.phase != Phase::AwaitingDuration {
                return StartOutcome::Stale;
            }

            let Some(pool) = session.pool.clone() else {
                return StartOutcome::Stale;
            };

            let mut rng = ChaCha8Rng::from_os_rng();
            session.quiz_set = pool
                .choose_multiple(&mut rng, session.requested_count)
                .cloned()
                .collect();
            session.quiz_set.shuffle(&mut rng);

            session.duration = Some(duration);
            session.started_at = Some(Instant::now());
            session.current_index = 0;
            session.phase = Phase::InProgress;
            session.touch();

            StartOutcome::Started(Self::build_presentation(session, &mut rng))
        });

        match outcome {
            None | Some(StartOutcome::Stale) => {
                debug!("Stale duration reply from user {}", user);
                Ok(())
            }
            Some(StartOutcome::Started(view)) => {
                let engine = Arc::clone(self);
                self.timers.start(user, duration, async move {
                    engine.expire(user).await;
                });

                let started = format!(
                    "Test started!\nYou have {} minutes.\nGood luck!",
                    minutes
                );

                if let Err(e) = self.transport.present_notice(user, &started).await {
                    self.fail_session(user, &e);
                    return Err(e.into());
                }

                if let Err(e) = self.transport.present_question(user, &view).await {
                    self.fail_session(user, &e);
                    return Err(e.into());
                }

                info!(
                    "User {} started a {}-question quiz with {} minutes",
                    user, view.total, minutes
                );
                Ok(())
            }
        }
    }

    /* Question loop */

    async fn on_answer(
        self: &Arc<Self>,
        user: UserId,
        display_index: usize,
    ) -> Result<(), EngineError> {
        let outcome = self.store.with_session_mut(user, |session| {
            if session.phase != Phase::InProgress {
                return Advance::Stale;
            }

            let Some(presentation) = session.presentation.as_ref() else {
                return Advance::Stale;
            };

            let Some(chosen) = presentation.options.get(display_index).cloned() else {
                return Advance::Stale;
            };

            let correct = presentation.correct_answer.clone();
            let is_correct = chosen == correct;

            session.answers.push(AnswerRecord {
                prompt: presentation.prompt.clone(),
                chosen,
                correct,
                is_correct,
            });

            if is_correct {
                session.score += 1;
            }

            session.current_index += 1;
            session.presentation = None;
            session.touch();

            if session.current_index >= session.requested_count {
                session.phase = Phase::Finished;
                Advance::Done
            } else {
                let mut rng = ChaCha8Rng::from_os_rng();
                Advance::Next(Self::build_presentation(session, &mut rng))
            }
        });

        match outcome {
            None => {
                self.transport.present_error(user, EXPIRED_MSG).await?;
                Ok(())
            }
            Some(Advance::Stale) => {
                debug!("Stale answer tap from user {}", user);
                Ok(())
            }
            Some(Advance::Done) => self.finish(user, FinishReason::Completed).await,
            Some(Advance::Next(view)) => {
                if let Err(e) = self.transport.present_question(user, &view).await {
                    self.fail_session(user, &e);
                    return Err(e.into());
                }

                Ok(())
            }
        }
    }

    /// Builds the next on-screen question: the record at the cursor with its
    /// four options freshly shuffled, stored for answer resolution.
    fn build_presentation(session: &mut Session, rng: &mut ChaCha8Rng) -> QuestionView {
        let record = &session.quiz_set[session.current_index];

        let mut options = vec![
            record.correct_answer.clone(),
            record.distractors[0].clone(),
            record.distractors[1].clone(),
            record.distractors[2].clone(),
        ];
        options.shuffle(rng);

        session.presentation = Some(Presentation {
            prompt: record.prompt.clone(),
            correct_answer: record.correct_answer.clone(),
            options: options.clone(),
        });

        QuestionView {
            prompt: record.prompt.clone(),
            options,
            number: session.current_index + 1,
            total: session.requested_count,
        }
    }

    /* Completion */

    async fn expire(self: &Arc<Self>, user: UserId) {
        if let Err(e) = self.finish(user, FinishReason::TimedOut).await {
            error!("Timer completion error for user {}: {}", user, e);
        }
    }

    /// The only way a quiz ends. Whoever wins the race to `take` the session
    /// computes the result; every other caller observes absence and exits.
    pub(crate) async fn finish(
        self: &Arc<Self>,
        user: UserId,
        reason: FinishReason,
    ) -> Result<(), EngineError> {
        let Some(session) = self.store.take(user) else {
            debug!("Finish ({:?}) for user {} found no session", reason, user);
            return Ok(());
        };

        if session.started_at.is_some() {
            let summary =
                ResultSummary::from_session(&session, reason, self.settings.max_wrong_rendered);

            info!(
                "Quiz finished for user {} ({:?}): {}/{}",
                user, reason, summary.score, summary.answered
            );
            debug!(
                "Finished session detail for user {}: category {:?}, difficulty {:?}",
                user, session.category, session.difficulty
            );

            if let Err(e) = self.transport.present_result(user, &summary).await {
                // Session is already gone; nothing left to unwind.
                error!("Failed to deliver result to user {}: {}", user, e);
            }
        } else if let Err(e) = self.transport.present_notice(user, CANCELLED_MSG).await {
            error!("Failed to deliver cancel notice to user {}: {}", user, e);
        }

        Ok(())
    }

    fn fail_session(&self, user: UserId, err: &TransportError) {
        error!(
            "Transport failure for user {}, tearing down session: {}",
            user, err
        );
        self.store.teardown(user);
    }

    /* Admin commands */

    async fn on_help(self: &Arc<Self>, user: UserId) -> Result<(), EngineError> {
        let mut help = String::from(
            "How to use:\n\
             1. /start - begin\n\
             2. Pick a category\n\
             3. Pick a difficulty\n\
             4. Send the number of questions\n\
             5. Send the time limit in minutes\n\
             6. Answer the questions\n\n\
             Commands:\n/start - restart\n/help - this text\n",
        );

        if user == self.settings.admin_user_id {
            help.push_str("\nAdmin commands:\n/stats - bot statistics\n/users - recent users\n");
        }

        if let Err(e) = self.transport.present_notice(user, &help).await {
            self.fail_session(user, &e);
            return Err(e.into());
        }

        Ok(())
    }

    async fn on_stats(self: &Arc<Self>, user: UserId) -> Result<(), EngineError> {
        if user != self.settings.admin_user_id {
            debug!("Ignoring /stats from non-admin user {}", user);
            return Ok(());
        }

        let snapshot = self.snapshot().await;
        let text = format!(
            "Bot statistics:\n\
             Active sessions: {}\n\
             Active timers: {}\n\
             Categories loaded: {}\n\
             Total users: {}",
            snapshot.active_sessions,
            snapshot.active_timers,
            snapshot.categories_loaded,
            snapshot.total_users
        );

        self.transport.present_notice(user, &text).await?;
        Ok(())
    }

    async fn on_users(self: &Arc<Self>, user: UserId) -> Result<(), EngineError> {
        if user != self.settings.admin_user_id {
            debug!("Ignoring /users from non-admin user {}", user);
            return Ok(());
        }

        let recent = self.ledger.recent(USERS_LISTED).await;
        if recent.is_empty() {
            self.transport
                .present_notice(user, "No user data recorded yet.")
                .await?;
            return Ok(());
        }

        let mut text = String::from("Recent users:\n\n");
        for (i, profile) in recent.iter().enumerate() {
            text.push_str(&format!(
                "{}. {}\n   ID: {}\n   Username: {}\n   Last seen: {}\n   Visits: {}\n\n",
                i + 1,
                profile.display_name(),
                profile.user_id,
                if profile.username.is_empty() {
                    "-"
                } else {
                    profile.username.as_str()
                },
                profile.last_seen.format("%Y-%m-%d %H:%M:%S"),
                profile.total_visits
            ));
        }

        self.transport.present_notice(user, &text).await?;
        Ok(())
    }
}
