//! Audio output
//!
//! `device` defines the boundary the playback controller drives; `output`
//! is the cpal implementation, fed by `decoder` and `resampler`.

pub mod decoder;
pub mod device;
pub mod output;
pub mod resampler;

pub use device::{
    DeviceEvent, DeviceFactory, DeviceNotifier, DeviceState, OutputDevice, StopCause,
};
pub use output::{CpalDeviceFactory, CpalOutputDevice};
