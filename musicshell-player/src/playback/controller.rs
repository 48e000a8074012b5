//! Playback controller
//!
//! Owns the current output device, the current playlist index and the
//! transition lock. Every state-mutating sequence (play, stop, next,
//! previous, auto-advance, dispose) runs under the transition lock, which is
//! always acquired with a timeout. Pause and the read-only queries never
//! wait on it.
//!
//! The device itself lives in a separate short-held slot. Device calls hold
//! the slot only for the duration of the call and never across an `.await`,
//! so a pause racing a transition sees either the old device or the new one,
//! never a half-released one.

use crate::audio::{DeviceEvent, DeviceFactory, DeviceNotifier, DeviceState, OutputDevice};
use crate::config::PlaybackTimings;
use crate::error::{Error, Result};
use crate::playback::status::{TransportOp, TransportStatus};
use crate::provider::MusicProvider;
use musicshell_common::events::{PlaybackState, PlayerEvent};
use musicshell_common::TrackDescriptor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the player event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Output device plus the generation its notifier was created with
pub(super) struct DeviceSlot {
    pub(super) device: Option<Box<dyn OutputDevice>>,
    pub(super) generation: u64,
    /// A track has been initialized on `device`
    pub(super) loaded: bool,
}

/// Skip direction for next/previous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn op(self) -> TransportOp {
        match self {
            Direction::Forward => TransportOp::Next,
            Direction::Backward => TransportOp::Previous,
        }
    }

    /// Wrap-around neighbour of `current` in a playlist of `count` tracks
    fn step(self, current: usize, count: usize) -> usize {
        let current = current % count;
        match self {
            Direction::Forward => (current + 1) % count,
            Direction::Backward => (current + count - 1) % count,
        }
    }
}

/// Clears the manual-skip flag when dropped
struct ManualSkipGuard<'a>(&'a AtomicBool);

impl<'a> ManualSkipGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ManualSkipGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Playlist playback controller
pub struct PlaybackController {
    pub(super) provider: Arc<dyn MusicProvider>,
    device_factory: Arc<dyn DeviceFactory>,
    pub(super) timings: PlaybackTimings,

    /// Serializes transitions; never held by pause or queries
    pub(super) transition: tokio::sync::Mutex<()>,

    pub(super) slot: Mutex<DeviceSlot>,

    /// Mutated only while holding `transition`
    pub(super) current_index: AtomicUsize,

    /// Set for the duration of a user-initiated next/previous
    pub(super) manual_skip: AtomicBool,

    disposed: AtomicBool,
    pub(super) cancel: CancellationToken,

    device_event_tx: mpsc::UnboundedSender<DeviceEvent>,
    /// Taken by the reactor on start
    device_event_rx: Mutex<Option<mpsc::UnboundedReceiver<DeviceEvent>>>,

    event_tx: broadcast::Sender<PlayerEvent>,
    reactor: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackController {
    /// Create a controller with a fresh output device
    ///
    /// The auto-advance reactor is not running until [`start`](Self::start).
    pub fn new(
        provider: Arc<dyn MusicProvider>,
        device_factory: Arc<dyn DeviceFactory>,
        timings: PlaybackTimings,
    ) -> Self {
        let (device_event_tx, device_event_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let controller = Self {
            provider,
            device_factory,
            timings,
            transition: tokio::sync::Mutex::new(()),
            slot: Mutex::new(DeviceSlot {
                device: None,
                generation: 0,
                loaded: false,
            }),
            current_index: AtomicUsize::new(0),
            manual_skip: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            device_event_tx,
            device_event_rx: Mutex::new(Some(device_event_rx)),
            event_tx,
            reactor: Mutex::new(None),
        };

        info!("Creating playback controller (provider: {})", controller.provider.name());
        controller.release_device();
        controller
    }

    /// Spawn the auto-advance reactor
    ///
    /// Must be called from within a tokio runtime. Calling it twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        let rx = lock_ignoring_poison(&self.device_event_rx).take();
        let Some(rx) = rx else {
            warn!("Playback controller already started");
            return;
        };

        let handle = tokio::spawn(super::reactor::run(
            Arc::downgrade(self),
            rx,
            self.cancel.clone(),
        ));
        *lock_ignoring_poison(&self.reactor) = Some(handle);
        info!("Playback controller started");
    }

    /// Subscribe to player events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Current playlist index (unsynchronized peek)
    pub fn current_index(&self) -> usize {
        self.current_index.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Conceptual playback state
    pub fn playback_state(&self) -> PlaybackState {
        let slot = self.lock_slot();
        match (&slot.device, slot.loaded) {
            (Some(device), true) => match device.state() {
                DeviceState::Playing => PlaybackState::Playing,
                DeviceState::Paused => PlaybackState::Paused,
                DeviceState::Stopped => PlaybackState::Stopped,
            },
            _ => PlaybackState::Idle,
        }
    }

    // ---------------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------------

    /// Restart playback of the track at the current index
    pub async fn play(&self) -> TransportStatus {
        let _guard = match self.acquire(self.timings.play_lock_timeout()).await {
            Ok(guard) => guard,
            Err(status) => return status,
        };
        self.play_locked().await
    }

    /// Pause the current device without taking the transition lock
    pub fn pause(&self) -> TransportStatus {
        if self.is_disposed() {
            return TransportStatus::ShutDown;
        }

        let old_state = self.playback_state();
        let result = {
            let mut slot = self.lock_slot();
            match slot.device.as_mut() {
                Some(device) => device.pause(),
                None => Ok(()),
            }
        };

        match result {
            Ok(()) => {
                if old_state == PlaybackState::Playing {
                    self.emit_state_change(old_state, PlaybackState::Paused);
                }
                TransportStatus::Paused
            }
            Err(e) => {
                error!("Failed to pause playback: {}", e);
                TransportStatus::Failed(TransportOp::Pause)
            }
        }
    }

    /// Stop playback and release the device
    pub async fn stop(&self) -> TransportStatus {
        let _guard = match self.acquire(self.timings.stop_lock_timeout()).await {
            Ok(guard) => guard,
            Err(status) => return status,
        };
        self.stop_locked();
        TransportStatus::Stopped
    }

    /// Skip to the next track, wrapping to the first
    pub async fn next(&self) -> TransportStatus {
        self.skip(Direction::Forward).await
    }

    /// Skip to the previous track, wrapping to the last
    pub async fn previous(&self) -> TransportStatus {
        self.skip(Direction::Backward).await
    }

    async fn skip(&self, direction: Direction) -> TransportStatus {
        let _guard = match self.acquire(self.timings.play_lock_timeout()).await {
            Ok(guard) => guard,
            Err(status) => return status,
        };
        let _skip = ManualSkipGuard::set(&self.manual_skip);

        self.stop_locked();

        let playlist = match self.fetch_playlist().await {
            Ok(playlist) => playlist,
            Err(e) => {
                error!("Failed to read playlist for {:?}: {}", direction, e);
                return TransportStatus::Failed(direction.op());
            }
        };
        if playlist.is_empty() {
            return TransportStatus::NoSongs;
        }

        let from = self.current_index();
        let to = direction.step(from, playlist.len());
        self.current_index.store(to, Ordering::SeqCst);
        debug!("Manual {:?} skip: {} -> {}", direction, from, to);

        self.play_locked().await
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Track at `index`
    pub async fn song_info(&self, index: i64) -> Result<TrackDescriptor> {
        self.ensure_live()?;
        let position = match usize::try_from(index) {
            Ok(position) => position,
            Err(_) => {
                let count = self.fetch_playlist().await.map(|p| p.len()).unwrap_or(0);
                return Err(Error::IndexOutOfRange { index, count });
            }
        };

        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || provider.get_song_info(position))
            .await
            .map_err(|e| Error::Internal(format!("Song info task failed: {}", e)))?
    }

    /// Every track in the playlist
    pub async fn all_songs(&self) -> Result<Vec<TrackDescriptor>> {
        self.ensure_live()?;
        self.fetch_playlist().await
    }

    /// Titles of every track, in playlist order
    pub async fn list_songs(&self) -> Result<Vec<String>> {
        self.ensure_live()?;
        let playlist = self.fetch_playlist().await.map_err(Error::playlist_read)?;
        if playlist.is_empty() {
            return Err(Error::EmptyPlaylist);
        }
        Ok(playlist.into_iter().map(|track| track.title).collect())
    }

    /// Track at the current index, if something is playing or paused
    pub async fn current_song(&self) -> Result<TrackDescriptor> {
        self.ensure_live()?;
        let playlist = self.fetch_playlist().await?;
        if playlist.is_empty() {
            return Err(Error::NoCurrentSong);
        }

        let device_state = {
            let slot = self.lock_slot();
            slot.device
                .as_ref()
                .map(|device| device.state())
                .unwrap_or(DeviceState::Stopped)
        };
        if device_state == DeviceState::Stopped {
            return Err(Error::NoCurrentSong);
        }

        playlist
            .into_iter()
            .nth(self.current_index())
            .ok_or(Error::NoCurrentSong)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Shut the controller down
    ///
    /// Cancels pending auto-advance work, waits briefly for an in-flight
    /// transition and releases the device without creating a new one.
    /// Repeated calls are no-ops.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            debug!("Playback controller already disposed");
            return;
        }
        info!("Disposing playback controller");

        self.cancel.cancel();

        let timeout = self.timings.stop_lock_timeout();
        let guard = tokio::time::timeout(timeout, self.transition.lock()).await.ok();
        if guard.is_none() {
            warn!("Transition still in flight after {:?}, releasing device anyway", timeout);
        }

        self.dispose_installed_device();
        drop(guard);

        if let Some(handle) = lock_ignoring_poison(&self.reactor).take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }

        info!("Playback controller disposed");
    }

    // ---------------------------------------------------------------------
    // Internals (caller holds the transition lock)
    // ---------------------------------------------------------------------

    /// Acquire the transition lock, or the status to report instead
    async fn acquire(
        &self,
        timeout: Duration,
    ) -> std::result::Result<tokio::sync::MutexGuard<'_, ()>, TransportStatus> {
        if self.is_disposed() {
            return Err(TransportStatus::ShutDown);
        }

        let guard = tokio::select! {
            _ = self.cancel.cancelled() => return Err(TransportStatus::ShutDown),
            result = tokio::time::timeout(timeout, self.transition.lock()) => match result {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("{}", Error::LockTimeout(timeout));
                    return Err(TransportStatus::Busy);
                }
            },
        };

        if self.is_disposed() {
            return Err(TransportStatus::ShutDown);
        }
        Ok(guard)
    }

    /// Play the track at the current index on a freshly created device
    pub(super) async fn play_locked(&self) -> TransportStatus {
        let old_state = self.playback_state();
        self.release_device();

        let playlist = match self.fetch_playlist().await {
            Ok(playlist) => playlist,
            Err(e) => {
                error!("Failed to read playlist: {}", e);
                self.release_device();
                return TransportStatus::Failed(TransportOp::Play);
            }
        };
        if playlist.is_empty() {
            info!("Play requested but the playlist is empty");
            return TransportStatus::NoSongs;
        }

        let mut index = self.current_index();
        if index >= playlist.len() {
            debug!("Index {} past end of {}-track playlist, resetting to 0", index, playlist.len());
            index = 0;
            self.current_index.store(index, Ordering::SeqCst);
        }
        let track = playlist[index].clone();

        let device = self.lock_slot().device.take();
        let Some(mut device) = device else {
            error!("No output device available");
            return TransportStatus::Failed(TransportOp::Play);
        };

        let title = track.title.clone();
        let started = tokio::task::spawn_blocking(move || {
            let result = device.init(&track).and_then(|()| device.play());
            (device, result)
        })
        .await;

        match started {
            Ok((mut device, Ok(()))) if self.is_disposed() => {
                debug!("Controller disposed while starting '{}', releasing device", title);
                if let Err(e) = device.dispose() {
                    warn!("Failed to dispose output device: {}", e);
                }
                TransportStatus::ShutDown
            }
            Ok((device, Ok(()))) => {
                {
                    let mut slot = self.lock_slot();
                    slot.device = Some(device);
                    slot.loaded = true;
                }
                info!("Playing track {}: {}", index, title);
                self.emit(PlayerEvent::TrackStarted {
                    index,
                    title: title.clone(),
                    timestamp: chrono::Utc::now(),
                });
                self.emit_state_change(old_state, PlaybackState::Playing);
                TransportStatus::Playing(title)
            }
            Ok((device, Err(e))) => {
                error!("Failed to start '{}': {}", title, e);
                self.lock_slot().device = Some(device);
                self.release_device();
                TransportStatus::Failed(TransportOp::Play)
            }
            Err(e) => {
                error!("Device start task failed for '{}': {}", title, e);
                self.release_device();
                TransportStatus::Failed(TransportOp::Play)
            }
        }
    }

    /// Stop the device and release it
    pub(super) fn stop_locked(&self) {
        let old_state = self.playback_state();
        {
            let mut slot = self.lock_slot();
            if let Some(device) = slot.device.as_mut() {
                if let Err(e) = device.stop() {
                    warn!("Failed to stop output device: {}", e);
                }
            }
        }
        self.release_device();

        if old_state != PlaybackState::Idle {
            self.emit_state_change(old_state, PlaybackState::Stopped);
        }
    }

    /// Dispose the current device and install a fresh one
    ///
    /// Idempotent and infallible: failures are logged. If the factory fails
    /// the slot stays empty and the next play retries. Once disposed, no
    /// fresh device is installed.
    pub(super) fn release_device(&self) {
        self.dispose_installed_device();

        let mut slot = self.lock_slot();
        if self.is_disposed() {
            return;
        }

        let notifier = DeviceNotifier::new(slot.generation, self.device_event_tx.clone());
        match self.device_factory.create(notifier) {
            Ok(device) => slot.device = Some(device),
            Err(e) => error!("Failed to create output device: {}", e),
        }
    }

    /// Take the device out of the slot and dispose it with the slot unlocked
    ///
    /// Disposing a real device joins its output thread; pause and the
    /// state queries must not wait on that.
    fn dispose_installed_device(&self) {
        let device = {
            let mut slot = self.lock_slot();
            slot.loaded = false;
            // Events from the outgoing device are stale from here on
            slot.generation += 1;
            slot.device.take()
        };
        if let Some(mut device) = device {
            if let Err(e) = device.dispose() {
                warn!("Failed to dispose output device: {}", e);
            }
        }
    }

    /// Generation of the installed device
    pub(super) fn device_generation(&self) -> u64 {
        self.lock_slot().generation
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::Disposed);
        }
        Ok(())
    }

    /// Read the playlist off the async runtime
    pub(super) async fn fetch_playlist(&self) -> Result<Vec<TrackDescriptor>> {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || provider.get_playlist())
            .await
            .map_err(|e| Error::Internal(format!("Playlist task failed: {}", e)))?
    }

    pub(super) fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn emit_state_change(&self, old_state: PlaybackState, new_state: PlaybackState) {
        if old_state == new_state {
            return;
        }
        self.emit(PlayerEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    fn lock_slot(&self) -> MutexGuard<'_, DeviceSlot> {
        lock_ignoring_poison(&self.slot)
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
