//! Operation deadlines

use arena_core::{ArenaError, SessionState};
use arena_effects::MemorySessionStore;
use arena_registry::SessionRegistry;
use assert_matches::assert_matches;
use arena_testkit::{test_player, SlowStore};
use std::sync::Arc;
use std::time::Duration;

fn slow_registry(read: u64, commit: u64) -> Arc<SessionRegistry<SlowStore<MemorySessionStore>>> {
    arena_testkit::init_test_tracing();
    let store = SlowStore::new(
        MemorySessionStore::new(),
        Duration::from_millis(read),
        Duration::from_millis(commit),
    );
    Arc::new(SessionRegistry::with_defaults(store))
}

#[tokio::test(start_paused = true)]
async fn waiting_on_busy_session_times_out_cleanly() {
    let registry = slow_registry(0, 500);
    let id = registry.create("A", 4, None).await.unwrap().id;

    let holder = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.join(id, test_player(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = registry
        .within(Duration::from_millis(50))
        .join(id, test_player(2))
        .await
        .unwrap_err();
    assert_eq!(err, ArenaError::timeout("join"));
    assert!(err.is_retryable());

    holder.await.unwrap().unwrap();
    let read = registry.get(id).await.unwrap();
    assert_eq!(read.players, vec![test_player(1)]);
    assert_eq!(registry.active_locks(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_read_times_out_before_any_write() {
    let registry = slow_registry(200, 0);
    let session = registry.create("A", 4, None).await.unwrap();

    let err = registry
        .within(Duration::from_millis(50))
        .start(session.id)
        .await
        .unwrap_err();
    assert_eq!(err, ArenaError::timeout("start"));

    let read = registry.get(session.id).await.unwrap();
    assert_eq!(read.state, SessionState::Waiting);
    assert_eq!(read.version, 0);
    assert_eq!(registry.active_locks(), 0);
}

#[tokio::test(start_paused = true)]
async fn issued_commit_is_not_cut_short() {
    let registry = slow_registry(0, 300);
    let session = registry.create("A", 4, None).await.unwrap();

    // The deadline passes while the commit is in flight; the write still lands.
    let receipt = registry
        .within(Duration::from_millis(100))
        .join(session.id, test_player(1))
        .await
        .unwrap();
    assert_eq!(receipt.player_count, 1);
    assert_eq!(registry.get(session.id).await.unwrap().version, 1);
}

#[tokio::test(start_paused = true)]
async fn default_deadline_comes_from_config() {
    let registry = slow_registry(0, 0);
    let bounded = registry.within(registry.config().operation_timeout());
    assert!(bounded.remaining() <= Duration::from_millis(5_000));
    assert!(bounded.remaining() > Duration::from_millis(4_000));
}

#[tokio::test(start_paused = true)]
async fn create_in_flight_past_the_deadline_still_succeeds() {
    let registry = slow_registry(0, 200);

    let session = registry
        .within(Duration::from_millis(50))
        .create("A", 2, None)
        .await
        .unwrap();

    let waiting = registry.list("waiting").await.unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].id, session.id);
}

#[tokio::test(start_paused = true)]
async fn create_after_the_deadline_writes_nothing() {
    let registry = slow_registry(0, 0);
    let bounded = registry.within(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = bounded.create("A", 2, None).await.unwrap_err();
    assert_matches!(err, ArenaError::Timeout { .. });
    assert!(registry.list("waiting").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unbounded_timeout_is_accepted() {
    let registry = slow_registry(10, 10);
    let bounded = registry.within(Duration::MAX);

    let session = bounded.create("A", 2, None).await.unwrap();
    bounded.start(session.id).await.unwrap();
    assert_eq!(bounded.list("in_progress").await.unwrap().len(), 1);
}
