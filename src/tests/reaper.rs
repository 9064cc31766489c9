use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    session::{models::Session, reaper::spawn_reaper, store::SessionStore, timer::TimerSupervisor},
    tests::support::settle,
};

fn aged_store(timeout: Duration) -> SessionStore {
    SessionStore::new(Arc::new(TimerSupervisor::new()), 10, timeout)
}

#[tokio::test]
async fn reap_once_evicts_only_idle_sessions() {
    let store = aged_store(Duration::from_millis(50));

    store.put(1, Session::new(1));
    store.put(2, Session::new(2));
    store
        .with_session_mut(1, |session| {
            session.last_activity = Instant::now() - Duration::from_millis(200);
        })
        .unwrap();

    let evicted = store.reap_once();

    assert_eq!(evicted, 1);
    assert!(store.with_session(1, |_| ()).is_none());
    assert!(store.with_session(2, |_| ()).is_some());
}

#[tokio::test]
async fn reap_cancels_the_evicted_sessions_timer() {
    let timers = Arc::new(TimerSupervisor::new());
    let store = SessionStore::new(Arc::clone(&timers), 10, Duration::from_millis(50));

    store.put(1, Session::new(1));
    timers.start(1, Duration::from_secs(600), async {});
    store
        .with_session_mut(1, |session| {
            session.last_activity = Instant::now() - Duration::from_millis(200);
        })
        .unwrap();

    assert_eq!(store.reap_once(), 1);
    assert_eq!(store.snapshot().timers, 0);
}

#[tokio::test(start_paused = true)]
async fn reaper_loop_evicts_on_schedule_and_not_before() {
    let store = Arc::new(aged_store(Duration::from_millis(50)));

    store.put(1, Session::new(1));
    store
        .with_session_mut(1, |session| {
            session.last_activity = Instant::now() - Duration::from_millis(200);
        })
        .unwrap();

    let handle = spawn_reaper(Arc::clone(&store), Duration::from_secs(600));

    // Well before the first scheduled pass nothing is evicted.
    tokio::time::sleep(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(store.len(), 1);

    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;
    assert!(store.is_empty());

    handle.abort();
}
