//! Audio output using cpal
//!
//! `CpalOutputDevice` decodes a whole track on `init` and plays it through a
//! cpal stream. cpal streams are not `Send`, so each loaded track gets a
//! device thread that owns the stream and takes commands over a channel.
//! The same thread watches for the end of the track and reports it through
//! the device's notifier.

use super::decoder::{decode_file, remap_channels};
use super::device::{DeviceFactory, DeviceNotifier, DeviceState, OutputDevice, StopCause};
use super::resampler::resample;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use musicshell_common::TrackDescriptor;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the device thread checks for end of track
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Builds cpal devices bound to a named output (None = system default)
#[derive(Debug, Clone, Default)]
pub struct CpalDeviceFactory {
    device_name: Option<String>,
}

impl CpalDeviceFactory {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl DeviceFactory for CpalDeviceFactory {
    fn create(&self, notifier: DeviceNotifier) -> Result<Box<dyn OutputDevice>> {
        Ok(Box::new(CpalOutputDevice::new(self.device_name.clone(), notifier)))
    }
}

/// Device state shared with the device thread
#[derive(Debug, Default)]
struct SharedState(AtomicU8);

impl SharedState {
    fn load(&self) -> DeviceState {
        match self.0.load(Ordering::Acquire) {
            1 => DeviceState::Playing,
            2 => DeviceState::Paused,
            _ => DeviceState::Stopped,
        }
    }

    fn store(&self, state: DeviceState) {
        let raw = match state {
            DeviceState::Stopped => 0,
            DeviceState::Playing => 1,
            DeviceState::Paused => 2,
        };
        self.0.store(raw, Ordering::Release);
    }
}

enum Command {
    Play,
    Pause,
    Stop,
    Shutdown,
}

/// Handle to the thread owning the cpal stream
struct Worker {
    commands: mpsc::Sender<Command>,
    handle: JoinHandle<()>,
}

/// cpal output device for one track at a time
pub struct CpalOutputDevice {
    device_name: Option<String>,
    notifier: DeviceNotifier,
    state: Arc<SharedState>,
    worker: Option<Worker>,
}

impl CpalOutputDevice {
    pub fn new(device_name: Option<String>, notifier: DeviceNotifier) -> Self {
        Self {
            device_name,
            notifier,
            state: Arc::new(SharedState::default()),
            worker: None,
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        let worker = self
            .worker
            .as_ref()
            .ok_or_else(|| Error::Device("No track loaded".to_string()))?;
        worker
            .commands
            .send(command)
            .map_err(|_| Error::Device("Output thread has exited".to_string()))
    }

    fn shutdown_worker(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            // The thread may already be gone after a stream error
            let _ = worker.commands.send(Command::Shutdown);
            worker
                .handle
                .join()
                .map_err(|_| Error::Device("Output thread panicked".to_string()))?;
        }
        self.state.store(DeviceState::Stopped);
        Ok(())
    }
}

impl OutputDevice for CpalOutputDevice {
    fn init(&mut self, track: &TrackDescriptor) -> Result<()> {
        self.shutdown_worker()?;

        let audio = decode_file(&track.locator)?;
        let device_name = self.device_name.clone();
        let notifier = self.notifier.clone();
        let state = Arc::clone(&self.state);
        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        debug!("Loaded {} ({} frames)", track.title, audio.frames());

        let handle = std::thread::Builder::new()
            .name("musicshell-output".to_string())
            .spawn(move || {
                let playback = match open_stream(device_name.as_deref(), audio) {
                    Ok(playback) => {
                        let _ = ready_tx.send(Ok(()));
                        playback
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run_device_thread(playback, rx, state, notifier);
            })
            .map_err(|e| Error::Device(format!("Failed to spawn output thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(Worker { commands, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(Error::Device("Output thread exited during setup".to_string()))
            }
        }
    }

    fn play(&mut self) -> Result<()> {
        self.send(Command::Play)?;
        self.state.store(DeviceState::Playing);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        // A finished track stays loaded but must keep reporting Stopped
        if self.worker.is_none() || self.state.load() != DeviceState::Playing {
            return Ok(());
        }
        self.send(Command::Pause)?;
        self.state.store(DeviceState::Paused);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.worker.is_none() || self.state.load() == DeviceState::Stopped {
            return Ok(());
        }
        self.send(Command::Stop)?;
        self.state.store(DeviceState::Stopped);
        Ok(())
    }

    fn state(&self) -> DeviceState {
        self.state.load()
    }

    fn dispose(&mut self) -> Result<()> {
        self.shutdown_worker()
    }
}

impl Drop for CpalOutputDevice {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown_worker() {
            warn!("Output device teardown failed: {}", e);
        }
    }
}

/// Stream plus the flags its callback shares with the device thread
struct StreamPlayback {
    stream: Stream,
    playing: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    position: Arc<AtomicUsize>,
    stream_error: Arc<Mutex<Option<String>>>,
}

fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    if let Some(name) = name {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::Device(format!("Failed to enumerate devices: {}", e)))?;
        if let Some(device) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            return Ok(device);
        }
        warn!("Requested device '{}' not found, falling back to default device", name);
    }

    host.default_output_device()
        .ok_or_else(|| Error::Device("No default output device found".to_string()))
}

/// Open the output device and build a paused stream for `audio`
fn open_stream(device_name: Option<&str>, audio: super::decoder::DecodedAudio) -> Result<StreamPlayback> {
    let host = cpal::default_host();
    let device = find_device(&host, device_name)?;
    let supported = device
        .default_output_config()
        .map_err(|e| Error::Device(format!("Failed to get default config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();

    info!(
        "Using audio device {} ({}Hz, {} channels, {:?})",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate.0,
        config.channels,
        sample_format
    );

    let resampled = resample(&audio.samples, audio.sample_rate, config.sample_rate.0, audio.channels)?;
    let samples: Arc<[f32]> = remap_channels(&resampled, audio.channels, config.channels).into();

    let playing = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let position = Arc::new(AtomicUsize::new(0));
    let stream_error = Arc::new(Mutex::new(None));

    let flags = CallbackFlags {
        samples,
        playing: Arc::clone(&playing),
        finished: Arc::clone(&finished),
        position: Arc::clone(&position),
        stream_error: Arc::clone(&stream_error),
    };

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, flags)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, flags)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, flags)?,
        other => {
            return Err(Error::Device(format!("Unsupported sample format: {:?}", other)));
        }
    };

    Ok(StreamPlayback {
        stream,
        playing,
        finished,
        position,
        stream_error,
    })
}

struct CallbackFlags {
    samples: Arc<[f32]>,
    playing: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    position: Arc<AtomicUsize>,
    stream_error: Arc<Mutex<Option<String>>>,
}

fn build_stream<T>(device: &cpal::Device, config: &StreamConfig, flags: CallbackFlags) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let CallbackFlags {
        samples,
        playing,
        finished,
        position,
        stream_error,
    } = flags;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !playing.load(Ordering::Acquire) {
                    data.fill(T::EQUILIBRIUM);
                    return;
                }

                let mut pos = position.load(Ordering::Relaxed);
                for out in data.iter_mut() {
                    *out = match samples.get(pos) {
                        Some(sample) => {
                            pos += 1;
                            T::from_sample(sample.clamp(-1.0, 1.0))
                        }
                        None => T::EQUILIBRIUM,
                    };
                }
                position.store(pos, Ordering::Relaxed);

                if pos >= samples.len() {
                    finished.store(true, Ordering::Release);
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                if let Ok(mut slot) = stream_error.lock() {
                    slot.get_or_insert_with(|| err.to_string());
                }
            },
            None,
        )
        .map_err(|e| Error::Device(format!("Failed to build stream: {}", e)))
}

/// Command loop of the device thread
fn run_device_thread(
    playback: StreamPlayback,
    commands: mpsc::Receiver<Command>,
    state: Arc<SharedState>,
    notifier: DeviceNotifier,
) {
    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(Command::Play) => {
                if let Err(e) = playback.stream.play() {
                    error!("Failed to start stream: {}", e);
                    state.store(DeviceState::Stopped);
                    notifier.playback_stopped(StopCause::Error(e.to_string()));
                    break;
                }
                playback.playing.store(true, Ordering::Release);
            }
            Ok(Command::Pause) => {
                playback.playing.store(false, Ordering::Release);
                if let Err(e) = playback.stream.pause() {
                    // Callback already outputs silence while not playing
                    debug!("Stream pause not supported: {}", e);
                }
            }
            Ok(Command::Stop) => {
                playback.playing.store(false, Ordering::Release);
                let _ = playback.stream.pause();
                playback.position.store(0, Ordering::Relaxed);
                playback.finished.store(false, Ordering::Release);
                notifier.playback_stopped(StopCause::Requested);
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let stream_error = playback.stream_error.lock().ok().and_then(|mut slot| slot.take());
        if let Some(message) = stream_error {
            playback.playing.store(false, Ordering::Release);
            state.store(DeviceState::Stopped);
            notifier.playback_stopped(StopCause::Error(message));
            break;
        }

        if playback.finished.swap(false, Ordering::AcqRel) && playback.playing.load(Ordering::Acquire) {
            playback.playing.store(false, Ordering::Release);
            let _ = playback.stream.pause();
            state.store(DeviceState::Stopped);
            info!("Track finished");
            notifier.playback_stopped(StopCause::Finished);
        }
    }

    debug!("Output thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    /// Device with a worker whose thread has already exited, as after a
    /// finished track; returns the receiving end of its command channel
    fn loaded_device(state: DeviceState) -> (CpalOutputDevice, mpsc::Receiver<Command>) {
        let (event_tx, _event_rx) = unbounded_channel();
        let mut device = CpalOutputDevice::new(None, DeviceNotifier::new(1, event_tx));
        let (commands, rx) = mpsc::channel();
        let handle = std::thread::spawn(|| {});
        device.worker = Some(Worker { commands, handle });
        device.state.store(state);
        (device, rx)
    }

    #[test]
    fn test_pause_after_finish_stays_stopped() {
        let (mut device, rx) = loaded_device(DeviceState::Stopped);

        device.pause().unwrap();

        assert_eq!(device.state(), DeviceState::Stopped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_after_finish_sends_nothing() {
        let (mut device, rx) = loaded_device(DeviceState::Stopped);

        device.stop().unwrap();

        assert_eq!(device.state(), DeviceState::Stopped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_pause_while_playing() {
        let (mut device, rx) = loaded_device(DeviceState::Playing);

        device.pause().unwrap();

        assert_eq!(device.state(), DeviceState::Paused);
        assert!(matches!(rx.try_recv(), Ok(Command::Pause)));
    }

    #[test]
    fn test_pause_without_track_is_noop() {
        let (event_tx, _event_rx) = unbounded_channel();
        let mut device = CpalOutputDevice::new(None, DeviceNotifier::new(1, event_tx));

        device.pause().unwrap();

        assert_eq!(device.state(), DeviceState::Stopped);
    }
}
