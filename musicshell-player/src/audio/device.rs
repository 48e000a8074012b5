//! Output device boundary
//!
//! The playback controller treats the decoder + output pair as one opaque
//! resource. A device instance is created with a `DeviceNotifier`, its one
//! and only subscription for "playback stopped" notifications. Notifications
//! are delivered as `DeviceEvent` messages on a channel rather than as
//! callbacks, so the controller handles them on its own task.

use crate::error::Result;
use musicshell_common::TrackDescriptor;
use tokio::sync::mpsc;
use tracing::debug;

/// State reported by the device itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Stopped,
    Playing,
    Paused,
}

/// Why the device stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// Reached the end of the track
    Finished,
    /// `stop()` was called
    Requested,
    /// Output or decode failure
    Error(String),
}

/// Playback-stopped notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    /// Generation of the device instance that sent it
    pub generation: u64,
    pub cause: StopCause,
}

/// Sending half of a device's playback-stopped subscription
#[derive(Debug, Clone)]
pub struct DeviceNotifier {
    generation: u64,
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl DeviceNotifier {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<DeviceEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report that playback stopped
    ///
    /// Never fails: with no listener left the event is dropped.
    pub fn playback_stopped(&self, cause: StopCause) {
        let event = DeviceEvent {
            generation: self.generation,
            cause,
        };
        if self.tx.send(event).is_err() {
            debug!("Playback-stopped event dropped, no listener (generation {})", self.generation);
        }
    }
}

/// Decoder + output pair bound to at most one track at a time
pub trait OutputDevice: Send {
    /// Open `track` and prepare it for playback
    fn init(&mut self, track: &TrackDescriptor) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Stop playback; reports `StopCause::Requested` if it was playing or paused
    fn stop(&mut self) -> Result<()>;

    fn state(&self) -> DeviceState;

    /// Release the reader and the output. Safe to call more than once.
    fn dispose(&mut self) -> Result<()>;
}

/// Creates fresh device instances
pub trait DeviceFactory: Send + Sync {
    fn create(&self, notifier: DeviceNotifier) -> Result<Box<dyn OutputDevice>>;
}
