//! Platform Collaborators
//!
//! Best-effort hooks into whatever hosts the game: key-value persistence,
//! gameplay start/stop signals and mid-session ads. Nothing here may block
//! the simulation; every await the core makes is bounded by a timeout.

pub mod profile;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

pub use profile::{SaveManager, SaveProfile, ProfileError, SKINS, SKIN_COSTS, skin_color};

/// Failure of a platform call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// No platform to talk to
    #[error("platform unavailable")]
    Unavailable,

    /// Call did not finish in time
    #[error("platform call timed out")]
    Timeout,

    /// Persistence failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Ad request failed
    #[error("ad error: {0}")]
    Ad(String),
}

/// Await `future` for at most `limit_ms`, folding a timeout into
/// [`PlatformError::Timeout`].
pub async fn bounded<T, F>(limit_ms: u64, future: F) -> Result<T, PlatformError>
where
    F: Future<Output = Result<T, PlatformError>>,
{
    match tokio::time::timeout(Duration::from_millis(limit_ms), future).await {
        Ok(result) => result,
        Err(_) => Err(PlatformError::Timeout),
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stored value for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError>;

    /// Store `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        (**self).set(key, value).await
    }
}

/// In-process store used when the platform offers none.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `key = value`.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self { entries: RwLock::new(entries) }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// HOOKS
// =============================================================================

/// Receives ad lifecycle callbacks.
pub trait AdListener: Send {
    /// The ad started: pause and mute.
    fn on_pause(&mut self);

    /// The ad ended: resume and unmute.
    fn on_resume(&mut self);
}

/// Gameplay signals and monetization hooks.
#[async_trait]
pub trait PlatformHooks: Send + Sync {
    /// One-time SDK initialization.
    async fn init(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    /// Active play began.
    fn gameplay_start(&self);

    /// Active play stopped.
    fn gameplay_stop(&self);

    /// Show a mid-session interstitial.
    ///
    /// Implementations call `on_pause` when the ad actually starts and
    /// `on_resume` once it is over.
    async fn show_midgame_ad(&self, listener: &mut dyn AdListener) -> Result<(), PlatformError>;
}

/// No platform: every hook is a no-op and no ad is shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlatform;

#[async_trait]
impl PlatformHooks for NullPlatform {
    fn gameplay_start(&self) {}

    fn gameplay_stop(&self) {}

    async fn show_midgame_ad(&self, _listener: &mut dyn AdListener) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[async_trait]
impl<T: PlatformHooks + ?Sized> PlatformHooks for Arc<T> {
    async fn init(&self) -> Result<(), PlatformError> {
        (**self).init().await
    }

    fn gameplay_start(&self) {
        (**self).gameplay_start()
    }

    fn gameplay_stop(&self) {
        (**self).gameplay_stop()
    }

    async fn show_midgame_ad(&self, listener: &mut dyn AdListener) -> Result<(), PlatformError> {
        (**self).show_midgame_ad(listener).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<&'static str>);

    impl AdListener for Recorder {
        fn on_pause(&mut self) {
            self.0.push("pause");
        }

        fn on_resume(&mut self) {
            self.0.push("resume");
        }
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        let shared = Arc::new(MemoryStore::with_entry("a", "1"));
        assert_eq!(shared.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_null_platform_shows_nothing() {
        let platform = NullPlatform;
        platform.init().await.unwrap();
        let mut recorder = Recorder(Vec::new());
        platform.show_midgame_ad(&mut recorder).await.unwrap();
        assert!(recorder.0.is_empty());
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, PlatformError>(1)
        };
        assert_eq!(bounded(100, slow).await, Err(PlatformError::Timeout));

        let fast = async { Ok::<_, PlatformError>(2) };
        assert_eq!(bounded(100, fast).await, Ok(2));
    }
}
