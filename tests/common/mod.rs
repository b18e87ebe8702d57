#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tag_infinity::config::SimulationConfig;
use tag_infinity::game::input::{InputFrame, PlayerInput};
use tag_infinity::game::round::RoundManager;
use tag_infinity::platform::{AdListener, KeyValueStore, PlatformError, PlatformHooks};
use tag_infinity::{PlayerId, SessionPhase};

pub const P0: PlayerId = PlayerId::ALL[0];
pub const P1: PlayerId = PlayerId::ALL[1];
pub const P2: PlayerId = PlayerId::ALL[2];

/// Default config with short rounds.
pub fn short_config(round_duration_ms: f64, total_rounds: u32) -> SimulationConfig {
    SimulationConfig {
        round_duration_ms,
        total_rounds,
        ..SimulationConfig::default()
    }
}

/// P0 runs right and hops, P1 runs left.
pub fn busy_inputs() -> InputFrame {
    let mut frame = InputFrame::default();
    frame[P0] = PlayerInput::joined().with_right().with_jump();
    frame[P1] = PlayerInput::joined().with_left();
    frame
}

/// Feed frames of `frame_ms` until the round stops being active.
pub fn play_round<S, P>(manager: &mut RoundManager<S, P>, inputs: &InputFrame, frame_ms: f64) -> u64
where
    S: KeyValueStore,
    P: PlatformHooks,
{
    let mut steps = 0;
    for _ in 0..200_000 {
        if manager.phase() != SessionPhase::RoundActive {
            break;
        }
        steps += u64::from(manager.update(frame_ms, inputs).steps);
    }
    steps
}

/// Store whose writes always fail.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, PlatformError> {
        Err(PlatformError::Storage("read refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Storage("disk full".into()))
    }
}

/// What a [`RecordingPlatform`] does when asked for an ad.
#[derive(Clone, Copy, Debug)]
pub enum AdBehavior {
    /// Pause, then resume
    PauseResume,
    /// Pause, then fail without resuming
    PauseThenFail,
    /// Never finish
    Hang,
}

/// Platform that counts every call.
pub struct RecordingPlatform {
    pub inits: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub ads: AtomicUsize,
    pub fail_init: bool,
    pub ad: AdBehavior,
}

impl RecordingPlatform {
    pub fn new(ad: AdBehavior) -> Arc<Self> {
        Arc::new(Self::build(ad, false))
    }

    pub fn failing_init() -> Arc<Self> {
        Arc::new(Self::build(AdBehavior::PauseResume, true))
    }

    fn build(ad: AdBehavior, fail_init: bool) -> Self {
        Self {
            inits: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            ads: AtomicUsize::new(0),
            fail_init,
            ad,
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformHooks for RecordingPlatform {
    async fn init(&self) -> Result<(), PlatformError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            Err(PlatformError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn gameplay_start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn gameplay_stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn show_midgame_ad(&self, listener: &mut dyn AdListener) -> Result<(), PlatformError> {
        self.ads.fetch_add(1, Ordering::SeqCst);
        match self.ad {
            AdBehavior::PauseResume => {
                listener.on_pause();
                listener.on_resume();
                Ok(())
            }
            AdBehavior::PauseThenFail => {
                listener.on_pause();
                Err(PlatformError::Ad("no fill".into()))
            }
            AdBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }
    }
}

/// Mute handler that records every call.
pub fn mute_recorder() -> (Arc<Mutex<Vec<bool>>>, impl FnMut(bool) + Send + 'static) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    (calls, move |muted| sink.lock().unwrap().push(muted))
}
