//! Event types for the Music Shell event stream
//!
//! Player events are broadcast by the playback controller and streamed to
//! clients over SSE.

use serde::{Deserialize, Serialize};

/// Conceptual playback state as reported to clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum PlaybackState {
    /// No track loaded on the output device
    Idle,
    /// A track is playing
    Playing,
    /// A track is loaded but paused
    Paused,
    /// Playback stopped and the device released
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Events emitted by the player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track started playing
    TrackStarted {
        /// Playlist index of the track
        index: usize,
        title: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The output device reached the end of a track on its own
    TrackCompleted {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback moved on to the next track after a natural completion
    AutoAdvanced {
        from: usize,
        to: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::TrackStarted { .. } => "TrackStarted",
            PlayerEvent::TrackCompleted { .. } => "TrackCompleted",
            PlayerEvent::AutoAdvanced { .. } => "AutoAdvanced",
        }
    }
}
