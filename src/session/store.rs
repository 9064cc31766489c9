use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use dashmap::DashMap;
use serde::Serialize;
use tracing::info;

use crate::session::{
    models::{Session, UserId},
    timer::TimerSupervisor,
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreSnapshot {
    pub sessions: usize,
    pub timers: usize,
}

/// Capacity-bounded mapping from user id to session. Per-user mutual
/// exclusion comes from the map's per-key locking; the admission mutex only
/// guards the capacity check together with the reserving insert.
pub struct SessionStore {
    sessions: DashMap<UserId, Session>,
    timers: Arc<TimerSupervisor>,
    admission: Mutex<()>,
    max_sessions: usize,
    session_timeout: Duration,
}

impl SessionStore {
    pub fn new(
        timers: Arc<TimerSupervisor>,
        max_sessions: usize,
        session_timeout: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            timers,
            admission: Mutex::new(()),
            max_sessions,
            session_timeout,
        }
    }

    /// Refreshes activity for a known user, or reserves a slot for a new
    /// one. At capacity a reap pass runs first; returns false only when the
    /// store is still full afterwards.
    pub fn admit(&self, user: UserId) -> bool {
        if let Some(mut session) = self.sessions.get_mut(&user) {
            session.touch();
            return true;
        }

        let _guard = self
            .admission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(mut session) = self.sessions.get_mut(&user) {
            session.touch();
            return true;
        }

        if self.sessions.len() >= self.max_sessions {
            self.reap_once();

            if self.sessions.len() >= self.max_sessions {
                return false;
            }
        }

        self.sessions.insert(user, Session::new(user));
        true
    }

    /// Inserts or replaces. A prior session for the same user goes through
    /// the full teardown path first, so its timer cannot outlive it.
    pub fn put(&self, user: UserId, session: Session) {
        let _guard = self
            .admission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.teardown(user);
        self.sessions.insert(user, session);
    }

    /// The single teardown path: cancel the timer, then atomically remove
    /// and return the session. Racing callers get `None` and must do
    /// nothing further.
    pub fn take(&self, user: UserId) -> Option<Session> {
        self.timers.cancel(user);
        self.sessions.remove(&user).map(|(_, session)| session)
    }

    /// Idempotent removal. Returns whether a session was actually present.
    pub fn teardown(&self, user: UserId) -> bool {
        self.take(user).is_some()
    }

    pub fn touch(&self, user: UserId) {
        if let Some(mut session) = self.sessions.get_mut(&user) {
            session.touch();
        }
    }

    /// Runs `f` under the per-user lock. The closure must not block or
    /// perform I/O; transport calls happen after release.
    pub fn with_session_mut<R>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        self.sessions.get_mut(&user).map(|mut entry| f(&mut entry))
    }

    pub fn with_session<R>(&self, user: UserId, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.sessions.get(&user).map(|entry| f(&entry))
    }

    /// Evicts every session idle past the timeout. Candidates are collected
    /// first so the map is not mutated mid-iteration.
    pub fn reap_once(&self) -> usize {
        let expired: Vec<UserId> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_expired(self.session_timeout))
            .map(|entry| entry.user)
            .collect();

        let mut evicted = 0;
        for user in expired {
            if self.teardown(user) {
                info!("Removed expired session for user {}", user);
                evicted += 1;
            }
        }

        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            sessions: self.sessions.len(),
            timers: self.timers.active_count(),
        }
    }
}
