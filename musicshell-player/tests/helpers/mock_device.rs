//! Mock output devices
//!
//! Every device shares one `DeviceStats`, so tests can check that readers
//! are released and that at most one is ever open.

use musicshell_common::TrackDescriptor;
use musicshell_player::audio::{
    DeviceFactory, DeviceNotifier, DeviceState, OutputDevice, StopCause,
};
use musicshell_player::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct DeviceStats {
    pub created: AtomicUsize,
    pub disposed: AtomicUsize,
    pub inits: AtomicUsize,
    pub open_readers: AtomicIsize,
    pub max_open_readers: AtomicIsize,
}

impl DeviceStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn open_readers(&self) -> isize {
        self.open_readers.load(Ordering::SeqCst)
    }

    pub fn max_open_readers(&self) -> isize {
        self.max_open_readers.load(Ordering::SeqCst)
    }

    fn open_reader(&self) {
        let open = self.open_readers.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open_readers.fetch_max(open, Ordering::SeqCst);
    }

    fn close_reader(&self) {
        self.open_readers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle on the most recently created device
#[derive(Clone)]
struct DeviceHandle {
    notifier: DeviceNotifier,
    state: Arc<Mutex<DeviceState>>,
}

/// Behaviour shared by the factory and its devices
#[derive(Default)]
struct Behaviour {
    failing: Mutex<HashSet<PathBuf>>,
    finish_on_stop: AtomicBool,
    init_delay_ms: AtomicUsize,
    dispose_delay_ms: AtomicUsize,
}

pub struct MockDeviceFactory {
    stats: Arc<DeviceStats>,
    behaviour: Arc<Behaviour>,
    latest: Mutex<Option<DeviceHandle>>,
}

impl MockDeviceFactory {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(DeviceStats::default()),
            behaviour: Arc::new(Behaviour::default()),
            latest: Mutex::new(None),
        }
    }

    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    /// Opening `title`'s track opens the reader and then fails
    pub fn fail_track(&self, title: &str) {
        let path = super::track(title).locator;
        self.behaviour.failing.lock().unwrap().insert(path);
    }

    /// Report `Finished` instead of `Requested` on stop, the way some
    /// backends do
    pub fn set_finish_on_stop(&self, enabled: bool) {
        self.behaviour.finish_on_stop.store(enabled, Ordering::SeqCst);
    }

    /// Block in `init` for `delay`
    pub fn set_init_delay(&self, delay: Duration) {
        self.behaviour
            .init_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Block in `dispose` for `delay`, like a device joining its output thread
    pub fn set_dispose_delay(&self, delay: Duration) {
        self.behaviour
            .dispose_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Simulate the latest device reaching the end of its track
    pub fn finish_current(&self) {
        let handle = self.latest.lock().unwrap().clone();
        if let Some(handle) = handle {
            *handle.state.lock().unwrap() = DeviceState::Stopped;
            handle.notifier.playback_stopped(StopCause::Finished);
        }
    }

    /// Simulate an output failure on the latest device
    pub fn fail_current(&self, message: &str) {
        let handle = self.latest.lock().unwrap().clone();
        if let Some(handle) = handle {
            *handle.state.lock().unwrap() = DeviceState::Stopped;
            handle
                .notifier
                .playback_stopped(StopCause::Error(message.to_string()));
        }
    }

    /// Generation of the latest device's notifier
    pub fn latest_generation(&self) -> Option<u64> {
        self.latest
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| h.notifier.generation())
    }
}

impl DeviceFactory for MockDeviceFactory {
    fn create(&self, notifier: DeviceNotifier) -> Result<Box<dyn OutputDevice>> {
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(Mutex::new(DeviceState::Stopped));
        *self.latest.lock().unwrap() = Some(DeviceHandle {
            notifier: notifier.clone(),
            state: Arc::clone(&state),
        });
        Ok(Box::new(MockOutputDevice {
            stats: Arc::clone(&self.stats),
            behaviour: Arc::clone(&self.behaviour),
            notifier,
            state,
            loaded: false,
            disposed: false,
        }))
    }
}

struct MockOutputDevice {
    stats: Arc<DeviceStats>,
    behaviour: Arc<Behaviour>,
    notifier: DeviceNotifier,
    state: Arc<Mutex<DeviceState>>,
    loaded: bool,
    disposed: bool,
}

impl MockOutputDevice {
    fn set_state(&self, state: DeviceState) {
        *self.state.lock().unwrap() = state;
    }
}

impl OutputDevice for MockOutputDevice {
    fn init(&mut self, track: &TrackDescriptor) -> Result<()> {
        if self.disposed {
            return Err(Error::Device("device disposed".to_string()));
        }

        let delay = self.behaviour.init_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay as u64));
        }

        if self.loaded {
            self.stats.close_reader();
        }
        self.stats.open_reader();
        self.loaded = true;
        self.stats.inits.fetch_add(1, Ordering::SeqCst);

        if self.behaviour.failing.lock().unwrap().contains(&track.locator) {
            return Err(Error::Device(format!(
                "cannot open output for {}",
                track.locator.display()
            )));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if !self.loaded {
            return Err(Error::Device("nothing loaded".to_string()));
        }
        self.set_state(DeviceState::Playing);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.loaded && self.state() == DeviceState::Playing {
            self.set_state(DeviceState::Paused);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.loaded && self.state() != DeviceState::Stopped {
            self.set_state(DeviceState::Stopped);
            let cause = if self.behaviour.finish_on_stop.load(Ordering::SeqCst) {
                StopCause::Finished
            } else {
                StopCause::Requested
            };
            self.notifier.playback_stopped(cause);
        }
        Ok(())
    }

    fn state(&self) -> DeviceState {
        *self.state.lock().unwrap()
    }

    fn dispose(&mut self) -> Result<()> {
        let delay = self.behaviour.dispose_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay as u64));
        }

        if self.loaded {
            self.stats.close_reader();
            self.loaded = false;
        }
        if !self.disposed {
            self.disposed = true;
            self.stats.disposed.fetch_add(1, Ordering::SeqCst);
        }
        self.set_state(DeviceState::Stopped);
        Ok(())
    }
}
