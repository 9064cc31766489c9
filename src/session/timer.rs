use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::models::UserId;

struct TimerEntry {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Owns at most one outstanding countdown per user. Starting a timer
/// replaces (and aborts) any previous one for the same user; cancelling
/// after the timer has fired is a no-op.
pub struct TimerSupervisor {
    timers: DashMap<UserId, TimerEntry>,
    seq: AtomicU64,
}

impl TimerSupervisor {
    pub fn new() -> Self {
        Self {
            timers: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn start<F>(self: &Arc<Self>, user: UserId, duration: Duration, on_expire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.seq.fetch_add(1, Ordering::Relaxed);
        let supervisor = Arc::clone(self);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            // The firing task drops its own entry (generation-checked, so a
            // replacement timer is left alone) before running the expiry
            // logic. A concurrent cancel must never abort a finish in flight.
            supervisor
                .timers
                .remove_if(&user, |_, entry| entry.generation == generation);

            debug!("Countdown elapsed for user {}", user);
            on_expire.await;
        });

        if let Some(prev) = self.timers.insert(user, TimerEntry { generation, handle }) {
            prev.handle.abort();
        }
    }

    pub fn cancel(&self, user: UserId) {
        if let Some((_, entry)) = self.timers.remove(&user) {
            entry.handle.abort();
        }
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Default for TimerSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
