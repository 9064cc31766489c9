use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::info;

use crate::session::store::SessionStore;

/// Periodically evicts sessions idle past the store's timeout. Eviction
/// goes through the same teardown path as explicit cancellation.
pub fn spawn_reaper(store: Arc<SessionStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; skip it.
        interval.tick().await;

        loop {
            interval.tick().await;

            let evicted = store.reap_once();
            let snapshot = store.snapshot();
            info!(
                "Reaper pass: evicted {}, active sessions: {}, active timers: {}",
                evicted, snapshot.sessions, snapshot.timers
            );
        }
    })
}
