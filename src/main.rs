//! Tag Infinity Simulator
//!
//! Headless driver: plays a full scripted session against the in-memory
//! platform and checks that splitting frames differently reproduces the
//! same final state.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tag_infinity::{
    config::GameConfig,
    game::{events::GameEventData, input::PlayerInput, round::RoundManager},
    platform::{MemoryStore, NullPlatform, SaveProfile},
    InputFrame, PlayerId, SessionPhase, FIXED_STEP_MS, VERSION,
};

const HUMANS: [PlayerId; 2] = [PlayerId::ALL[0], PlayerId::ALL[1]];

/// How each fixed step of input is fed to the manager.
#[derive(Clone, Copy, Debug)]
enum Chunking {
    /// One call per step
    Whole,
    /// Two half-step calls per step
    Halves,
}

struct SessionSummary {
    hash: [u8; 32],
    steps: u64,
    tags: usize,
    profile: SaveProfile,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => GameConfig::default(),
    };

    info!("Tag Infinity Simulator v{}", VERSION);
    info!(
        "Seed: {}, {} rounds of {} s, step {:.3} ms",
        config.simulation.seed,
        config.simulation.total_rounds,
        config.simulation.round_duration_ms / 1000.0,
        FIXED_STEP_MS
    );

    let first = run_session(&config, Chunking::Whole).await?;
    info!("=== Session Results ===");
    info!("Steps: {}, tags: {}", first.steps, first.tags);
    info!("Coins: {}, skins: {:?}", first.profile.tag_coins, first.profile.unlocked_skin_ids);
    info!("Final State Hash: {}", hex::encode(first.hash));

    info!("=== Verifying Determinism ===");
    let second = run_session(&config, Chunking::Halves).await?;
    info!("Replay State Hash: {}", hex::encode(second.hash));

    if first.hash != second.hash || first.steps != second.steps {
        bail!("DETERMINISM FAILURE: hashes differ");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

async fn run_session(config: &GameConfig, chunking: Chunking) -> Result<SessionSummary> {
    let mut manager = RoundManager::new(config.simulation.clone(), MemoryStore::new(), NullPlatform)?;
    manager.init_session(&HUMANS, config.session).await?;

    let steps_per_round = (config.simulation.round_duration_ms / config.simulation.fixed_step_ms).ceil() as u64 + 2;
    let max_steps = u64::from(config.simulation.total_rounds) * steps_per_round;

    let mut steps = 0u64;
    let mut tags = 0;
    while manager.phase() != SessionPhase::SessionComplete {
        if steps > max_steps {
            bail!("session did not complete after {steps} steps");
        }

        let inputs = scripted_inputs(steps);
        let events = match chunking {
            Chunking::Whole => manager.advance(config.simulation.fixed_step_ms, &inputs).await.events,
            Chunking::Halves => {
                let half = config.simulation.fixed_step_ms / 2.0;
                let mut events = manager.advance(half, &inputs).await.events;
                events.extend(manager.advance(half, &inputs).await.events);
                events
            }
        };
        steps += 1;

        for event in &events {
            match &event.data {
                GameEventData::Tagged { .. } => tags += 1,
                GameEventData::RoundEnded { round_index, winner_id, best_combo_id } => {
                    info!("Round {} won by {}, best combo {}", round_index, winner_id, best_combo_id);
                }
                _ => {}
            }
        }
    }

    let snapshot = manager.snapshot();
    let mut profile = manager.save_manager().load_profile().await;
    if let Some(skin) = manager.save_manager().unlock_next_skin(&mut profile).await? {
        info!("Unlocked skin {}", skin);
    }

    Ok(SessionSummary {
        hash: snapshot.compute_hash(),
        steps,
        tags,
        profile,
    })
}

/// Input pattern as a pure function of the step counter.
fn scripted_inputs(step: u64) -> InputFrame {
    let mut frame = InputFrame::default();
    for (i, id) in HUMANS.iter().enumerate() {
        let phase = step + i as u64 * 37;
        let mut input = PlayerInput::joined();
        if (phase / 90) % 2 == 0 {
            input.set_right(true);
        } else {
            input.set_left(true);
        }
        input.set_jump(phase % 45 < 5);
        input.set_ability(phase % 240 == 0);
        frame[*id] = input;
    }
    frame
}
