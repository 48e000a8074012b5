//! Auto-advance on natural track completion
//!
//! Device playback-stopped notifications arrive on a channel and are handled
//! here, on the reactor task, never on the device thread. Only a natural
//! completion of the device that is still installed advances the playlist;
//! stops requested by the controller, device errors and completions that
//! race a manual skip are ignored.

use crate::audio::{DeviceEvent, StopCause};
use crate::playback::controller::PlaybackController;
use futures::FutureExt;
use musicshell_common::events::PlayerEvent;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Weak;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reactor loop; exits on cancellation, when the channel closes or when the
/// controller has been dropped
pub(super) async fn run(
    controller: Weak<PlaybackController>,
    mut events: mpsc::UnboundedReceiver<DeviceEvent>,
    cancel: CancellationToken,
) {
    debug!("Auto-advance reactor started");

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let Some(controller) = controller.upgrade() else {
            break;
        };

        let handled = AssertUnwindSafe(controller.on_playback_stopped(event))
            .catch_unwind()
            .await;
        if handled.is_err() {
            error!("Panic while handling playback-stopped event");
        }
    }

    debug!("Auto-advance reactor stopped");
}

impl PlaybackController {
    async fn on_playback_stopped(&self, event: DeviceEvent) {
        match &event.cause {
            StopCause::Error(message) => {
                warn!("Playback stopped with error, not advancing: {}", message);
                return;
            }
            StopCause::Requested => {
                debug!("Requested stop (generation {})", event.generation);
                return;
            }
            StopCause::Finished => {}
        }

        if !self.is_current_completion(&event) {
            return;
        }

        let finished_index = self.current_index();
        self.emit(PlayerEvent::TrackCompleted {
            index: finished_index,
            timestamp: chrono::Utc::now(),
        });

        // Let the device settle before starting the next track
        tokio::select! {
            _ = self.cancel.cancelled() => return,
            _ = tokio::time::sleep(self.timings.advance_grace()) => {}
        }

        let timeout = self.timings.advance_lock_timeout();
        let _guard = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = tokio::time::timeout(timeout, self.transition.lock()) => match result {
                Ok(guard) => guard,
                Err(_) => {
                    info!("Player busy after track completion, playback ends");
                    return;
                }
            },
        };

        if self.is_disposed() || !self.is_current_completion(&event) {
            return;
        }

        let playlist = match self.fetch_playlist().await {
            Ok(playlist) => playlist,
            Err(e) => {
                warn!("Failed to read playlist after track completion: {}", e);
                return;
            }
        };

        let current = self.current_index();
        if current + 1 >= playlist.len() {
            info!("Last track finished, playback ends");
            return;
        }

        let next = current + 1;
        self.current_index.store(next, Ordering::SeqCst);
        self.emit(PlayerEvent::AutoAdvanced {
            from: current,
            to: next,
            timestamp: chrono::Utc::now(),
        });

        let status = self.play_locked().await;
        if status.is_success() {
            debug!("Auto-advanced to track {}", next);
        } else {
            warn!("Auto-advance to track {} failed: {}", next, status);
        }
    }

    /// Completion of the installed device with no manual skip in progress
    fn is_current_completion(&self, event: &DeviceEvent) -> bool {
        if self.manual_skip.load(Ordering::SeqCst) {
            debug!("Completion during manual skip ignored");
            return false;
        }
        let generation = self.device_generation();
        if event.generation != generation {
            debug!(
                "Stale completion ignored (event generation {}, current {})",
                event.generation, generation
            );
            return false;
        }
        true
    }
}
