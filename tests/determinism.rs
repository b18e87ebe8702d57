mod common;

use common::{busy_inputs, short_config, P0, P1};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tag_infinity::config::SessionOptions;
use tag_infinity::game::round::RoundManager;
use tag_infinity::game::snapshot::RoundSnapshot;
use tag_infinity::platform::{MemoryStore, NullPlatform};
use tag_infinity::SessionPhase;

const ROUND_MS: f64 = 4000.0;

async fn play_round_with(seed: u64, mut next_delta: impl FnMut() -> f64) -> RoundSnapshot {
    let config = tag_infinity::SimulationConfig {
        seed,
        ..short_config(ROUND_MS, 1)
    };
    let mut manager = RoundManager::new(config, MemoryStore::new(), NullPlatform).unwrap();
    manager.init_session(&[P0, P1], SessionOptions::default()).await.unwrap();

    let inputs = busy_inputs();
    for _ in 0..100_000 {
        if manager.phase() != SessionPhase::RoundActive {
            break;
        }
        manager.update(next_delta(), &inputs);
    }
    assert_eq!(manager.phase(), SessionPhase::Finalizing);
    manager.snapshot()
}

fn assert_same_state(a: &RoundSnapshot, b: &RoundSnapshot) {
    assert_eq!(a.compute_hash(), b.compute_hash());
    assert_eq!(a.scores, b.scores);
    assert_eq!(a.it_player, b.it_player);
    assert_eq!(a.players, b.players);
    assert_eq!(a.map.id(), b.map.id());
}

#[tokio::test]
async fn test_frame_rate_does_not_change_outcome() {
    let reference = play_round_with(444, || 1000.0 / 120.0).await;

    for frame_ms in [1000.0 / 60.0, 1000.0 / 30.0, 100.0, 7.3, 250.0] {
        let other = play_round_with(444, || frame_ms).await;
        assert_same_state(&reference, &other);
    }
}

#[tokio::test]
async fn test_random_partitions_match() {
    let reference = play_round_with(444, || 1000.0 / 60.0).await;

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let other = play_round_with(444, || rng.gen_range(0.0..60.0)).await;
        assert_same_state(&reference, &other);
    }
}

#[tokio::test]
async fn test_seed_changes_outcome() {
    let a = play_round_with(444, || 16.0).await;
    let b = play_round_with(444, || 16.0).await;
    let c = play_round_with(445, || 16.0).await;
    assert_eq!(a.compute_hash(), b.compute_hash());
    assert_ne!(a.compute_hash(), c.compute_hash());
}

#[tokio::test]
async fn test_full_session_event_stream_is_reproducible() {
    async fn session_events(frame_ms: f64) -> Vec<String> {
        let mut manager = RoundManager::new(short_config(1500.0, 3), MemoryStore::new(), NullPlatform).unwrap();
        manager.init_session(&[P0, P1], SessionOptions::default()).await.unwrap();

        let inputs = busy_inputs();
        let mut events = Vec::new();
        for _ in 0..10_000 {
            if manager.phase() == SessionPhase::SessionComplete {
                break;
            }
            let result = manager.advance(frame_ms, &inputs).await;
            events.extend(result.events.iter().map(|e| format!("{:?}", e)));
        }
        assert_eq!(manager.phase(), SessionPhase::SessionComplete);
        events
    }

    let a = session_events(1000.0 / 60.0).await;
    let b = session_events(1000.0 / 60.0).await;
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_any_chunking_matches_fixed_steps(chunks in prop::collection::vec(0.5f64..100.0, 1..20)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let reference = runtime.block_on(play_round_with(444, || 1000.0 / 120.0));

        let mut cycle = chunks.iter().copied().cycle();
        let other = runtime.block_on(play_round_with(444, move || cycle.next().unwrap_or(16.0)));

        prop_assert_eq!(reference.compute_hash(), other.compute_hash());
        prop_assert_eq!(reference.scores, other.scores);
    }
}
