use std::{
    sync::Arc,
    time::Duration,
};

use futures::future::join_all;

use crate::session::{models::Session, store::SessionStore, timer::TimerSupervisor};

fn store_with(max_sessions: usize, timeout: Duration) -> SessionStore {
    SessionStore::new(Arc::new(TimerSupervisor::new()), max_sessions, timeout)
}

#[tokio::test]
async fn admit_reserves_slot_and_touches_existing() {
    let store = store_with(10, Duration::from_secs(3600));

    assert!(store.admit(1));
    assert_eq!(store.len(), 1);

    // Second admit for the same user refreshes, never double-books.
    assert!(store.admit(1));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn admission_denied_at_capacity() {
    let store = store_with(1, Duration::from_secs(3600));

    assert!(store.admit(1));
    assert!(!store.admit(2));
    assert_eq!(store.len(), 1);

    // The existing user is still welcome.
    assert!(store.admit(1));
}

#[tokio::test]
async fn admission_reaps_expired_to_free_slot() {
    let store = store_with(1, Duration::ZERO);

    assert!(store.admit(1));
    std::thread::sleep(Duration::from_millis(5));

    assert!(store.admit(2));
    assert_eq!(store.len(), 1);
    assert!(store.with_session(2, |_| ()).is_some());
    assert!(store.with_session(1, |_| ()).is_none());
}

#[tokio::test]
async fn put_tears_down_previous_timer() {
    let timers = Arc::new(TimerSupervisor::new());
    let store = SessionStore::new(Arc::clone(&timers), 10, Duration::from_secs(3600));

    store.put(7, Session::new(7));
    timers.start(7, Duration::from_secs(300), async {});
    assert_eq!(store.snapshot().timers, 1);

    store.put(7, Session::new(7));
    assert_eq!(store.snapshot().timers, 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn teardown_is_idempotent() {
    let store = store_with(10, Duration::from_secs(3600));
    store.put(3, Session::new(3));

    assert!(store.teardown(3));
    assert!(!store.teardown(3));
    assert!(store.take(3).is_none());
}

#[tokio::test]
async fn touch_is_a_noop_for_absent_users() {
    let store = store_with(10, Duration::from_secs(3600));
    store.touch(42);
    assert!(store.is_empty());
}

#[tokio::test]
async fn snapshot_reports_sessions_and_timers() {
    let timers = Arc::new(TimerSupervisor::new());
    let store = SessionStore::new(Arc::clone(&timers), 10, Duration::from_secs(3600));

    store.put(1, Session::new(1));
    store.put(2, Session::new(2));
    timers.start(1, Duration::from_secs(60), async {});

    let snapshot = store.snapshot();
    assert_eq!(snapshot.sessions, 2);
    assert_eq!(snapshot.timers, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_admits_respect_capacity() {
    let store = Arc::new(store_with(50, Duration::from_secs(3600)));

    let mut handles = Vec::new();
    for user in 0..100i64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.admit(user) }));
    }

    let results = join_all(handles).await;
    let admitted = results
        .into_iter()
        .filter(|result| *result.as_ref().unwrap())
        .count();

    assert_eq!(admitted, 50);
    assert_eq!(store.len(), 50);
}
