//! Transport operation results
//!
//! Transport operations never fail in the `Result` sense: lock contention,
//! an empty playlist and device failures are all reported as a status the
//! caller can show to the user.

use std::fmt;

/// Which transport operation produced a failure status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
}

/// Outcome of a transport operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// Playback started on the named track
    Playing(String),
    Paused,
    Stopped,
    /// The playlist is empty; nothing was initialized
    NoSongs,
    /// The transition lock was not acquired in time; retry later
    Busy,
    /// The controller has been disposed
    ShutDown,
    /// The operation failed; the device was left released
    Failed(TransportOp),
}

impl TransportStatus {
    /// True for `Playing`, `Paused` and `Stopped`
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TransportStatus::Playing(_) | TransportStatus::Paused | TransportStatus::Stopped
        )
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportStatus::Playing(title) => write!(f, "Playing: {}", title),
            TransportStatus::Paused => write!(f, "Music paused."),
            TransportStatus::Stopped => write!(f, "Music stopped."),
            TransportStatus::NoSongs => write!(f, "No songs available in the playlist."),
            TransportStatus::Busy => write!(f, "Player is busy, please retry."),
            TransportStatus::ShutDown => write!(f, "Player has shut down."),
            TransportStatus::Failed(op) => match op {
                TransportOp::Play => write!(f, "Error playing song."),
                TransportOp::Pause => write!(f, "Error pausing song."),
                TransportOp::Stop => write!(f, "Error stopping song."),
                TransportOp::Next => write!(f, "Error playing next song."),
                TransportOp::Previous => write!(f, "Error playing previous song."),
            },
        }
    }
}
