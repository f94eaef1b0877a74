//! Property tests over registry operation sequences
//!
//! Each case runs on its own current-thread runtime. Concurrent cases spawn
//! every operation as a task so they interleave at store await points.

use arena_core::{ArenaError, EndPolicy, RegistryConfig, Score, Session, SessionState};
use arena_effects::MemorySessionStore;
use arena_registry::SessionRegistry;
use arena_testkit::{assert_history_monotonic, assert_session_invariants, test_player};
use futures::future::join_all;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Op {
    Join(u8),
    Start,
    End(i64),
    Get,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1u8..10).prop_map(Op::Join),
        1 => Just(Op::Start),
        1 => (-50i64..50).prop_map(Op::End),
        2 => Just(Op::Get),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn registry(lenient_end: bool) -> Arc<SessionRegistry<MemorySessionStore>> {
    let config = RegistryConfig {
        end_policy: if lenient_end {
            EndPolicy::Lenient
        } else {
            EndPolicy::Strict
        },
        ..RegistryConfig::default()
    };
    Arc::new(SessionRegistry::new(MemorySessionStore::new(), config).unwrap())
}

async fn run(registry: &SessionRegistry<MemorySessionStore>, session: &Session, op: Op) -> Result<Session, ArenaError> {
    match op {
        Op::Join(seed) => {
            registry.join(session.id, test_player(seed)).await?;
            registry.get(session.id).await
        }
        Op::Start => registry.start(session.id).await,
        Op::End(score) => registry.end(session.id, Score::new(score)).await,
        Op::Get => registry.get(session.id).await,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sequential_history_is_monotonic(
        max_players in 1u32..5,
        lenient_end in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..30),
    ) {
        let history = runtime().block_on(async {
            let registry = registry(lenient_end);
            let session = registry.create("prop", max_players, None).await.unwrap();
            let mut history = vec![session.clone()];
            for op in ops {
                if let Ok(snapshot) = run(&registry, &session, op).await {
                    history.push(snapshot);
                }
            }
            history
        });

        assert_history_monotonic(&history);
        for snapshot in &history {
            assert_session_invariants(snapshot);
        }
    }

    #[test]
    fn concurrent_commits_form_a_legal_chain(
        max_players in 1u32..6,
        lenient_end in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut history = runtime().block_on(async {
            let registry = registry(lenient_end);
            let session = registry.create("prop", max_players, None).await.unwrap();
            let tasks = ops.into_iter().map(|op| {
                let registry = Arc::clone(&registry);
                let session = session.clone();
                tokio::spawn(async move { run(&registry, &session, op).await })
            });
            let mut history: Vec<Session> = join_all(tasks)
                .await
                .into_iter()
                .filter_map(|joined| joined.unwrap().ok())
                .collect();
            history.push(session);
            history
        });

        history.sort_by_key(|snapshot| snapshot.version);
        history.dedup_by_key(|snapshot| snapshot.version);
        assert_history_monotonic(&history);
        for snapshot in &history {
            prop_assert!(snapshot.player_count() <= max_players as usize);
        }
    }

    #[test]
    fn exactly_capacity_joins_succeed(capacity in 1u32..8, extra in 1u8..12) {
        let callers = capacity as u8 + extra;
        let (admitted, full, final_count) = runtime().block_on(async {
            let registry = registry(false);
            let id = registry.create("crowd", capacity, None).await.unwrap().id;
            let tasks = (1..=callers).map(|seed| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.join(id, test_player(seed)).await })
            });
            let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();
            let admitted = results.iter().filter(|r| r.is_ok()).count();
            let full = results
                .iter()
                .filter(|r| matches!(r, Err(ArenaError::SessionFull { .. })))
                .count();
            let final_count = registry.get(id).await.unwrap().player_count();
            (admitted, full, final_count)
        });

        prop_assert_eq!(admitted, capacity as usize);
        prop_assert_eq!(full, extra as usize);
        prop_assert_eq!(final_count, capacity as usize);
    }

    #[test]
    fn joins_outside_waiting_never_mutate(
        finish in any::<bool>(),
        seed in 2u8..20,
    ) {
        let (before, after, err) = runtime().block_on(async {
            let registry = registry(false);
            let session = registry.create("closed", 4, Some(test_player(1))).await.unwrap();
            registry.start(session.id).await.unwrap();
            if finish {
                registry.end(session.id, Score::new(0)).await.unwrap();
            }
            let before = registry.get(session.id).await.unwrap();
            let err = registry.join(session.id, test_player(seed)).await.unwrap_err();
            let after = registry.get(session.id).await.unwrap();
            (before, after, err)
        });

        let expected_state = if finish { SessionState::Finished } else { SessionState::InProgress };
        prop_assert_eq!(err, ArenaError::NotJoinable { session_id: before.id, state: expected_state });
        prop_assert_eq!(before, after);
    }
}
