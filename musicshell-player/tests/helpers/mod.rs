//! Test helpers for musicshell-player integration tests
//!
//! - `MockDeviceFactory`: output devices that count open readers and can be
//!   told to finish a track or fail to open one
//! - `InMemoryProvider`: a playlist the test can rewrite between calls
//! - `TestPlayer`: a started controller wired to both

#![allow(dead_code)]

pub mod mock_device;
pub mod mock_provider;

pub use mock_device::{DeviceStats, MockDeviceFactory};
pub use mock_provider::{track, InMemoryProvider};

use musicshell_player::config::PlaybackTimings;
use musicshell_player::playback::PlaybackController;
use std::sync::Arc;
use std::time::Duration;

/// Timings with a short advance grace so tests stay fast
pub fn fast_timings() -> PlaybackTimings {
    PlaybackTimings {
        play_lock_timeout_ms: 2000,
        stop_lock_timeout_ms: 1000,
        advance_grace_ms: 20,
        advance_lock_timeout_ms: 1000,
    }
}

/// Controller over an in-memory playlist and mock devices
pub struct TestPlayer {
    pub controller: Arc<PlaybackController>,
    pub provider: Arc<InMemoryProvider>,
    pub devices: Arc<MockDeviceFactory>,
}

impl TestPlayer {
    /// Started controller over `titles`; call from inside a tokio runtime
    pub fn new(titles: &[&str]) -> Self {
        Self::with_timings(titles, fast_timings())
    }

    pub fn with_timings(titles: &[&str], timings: PlaybackTimings) -> Self {
        let provider = Arc::new(InMemoryProvider::with_titles(titles));
        let devices = Arc::new(MockDeviceFactory::new());
        let controller = Arc::new(PlaybackController::new(
            provider.clone(),
            devices.clone(),
            timings,
        ));
        controller.start();
        Self {
            controller,
            provider,
            devices,
        }
    }

    pub fn stats(&self) -> &DeviceStats {
        self.devices.stats()
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
