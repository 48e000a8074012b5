//! Track descriptors
//!
//! A `TrackDescriptor` is the immutable value a playlist source hands to the
//! player. `SongInfoDto` is its shape on the wire.

use crate::human_time::format_mm_ss;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Artist used when a file carries no performer tag
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Immutable description of one playable track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Display title
    pub title: String,
    /// File path or stream locator
    pub locator: PathBuf,
    /// Track length
    pub duration: Duration,
    /// Performing artist
    pub artist: String,
}

impl TrackDescriptor {
    pub fn new(
        title: impl Into<String>,
        locator: impl Into<PathBuf>,
        duration: Duration,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
            duration,
            artist: artist.into(),
        }
    }

    /// Duration formatted as `mm:ss`
    pub fn formatted_duration(&self) -> String {
        format_mm_ss(self.duration)
    }

    pub fn to_dto(&self) -> SongInfoDto {
        SongInfoDto::from(self)
    }
}

/// Song information as returned by the HTTP API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfoDto {
    pub title: String,
    pub file_path: String,
    /// `mm:ss`
    pub duration: String,
    pub artist: String,
}

impl From<&TrackDescriptor> for SongInfoDto {
    fn from(track: &TrackDescriptor) -> Self {
        Self {
            title: track.title.clone(),
            file_path: track.locator.to_string_lossy().into_owned(),
            duration: track.formatted_duration(),
            artist: track.artist.clone(),
        }
    }
}
