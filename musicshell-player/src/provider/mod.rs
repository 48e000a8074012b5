//! Playlist sources
//!
//! A `MusicProvider` supplies the ordered, indexable playlist the player
//! works through. The local filesystem is the only backend with an
//! implementation; streaming services are declared so configuration can
//! name them, and fail fast with `Error::NotSupported`.

mod local;
mod streaming;
mod tags;

pub use local::LocalMusicProvider;
pub use streaming::{PandoraMusicProvider, SpotifyMusicProvider};
pub use tags::{LoftyTagReader, TagReader, TrackTags};

use crate::config::Config;
use crate::error::{Error, Result};
use musicshell_common::TrackDescriptor;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// Source of the playlist
///
/// Both operations may block (directory scans, tag reads, network calls).
/// Callers re-query on every use instead of caching, so the playlist may
/// change between calls.
pub trait MusicProvider: Send + Sync {
    /// Short backend name for logging
    fn name(&self) -> &'static str;

    /// Full playlist in play order
    fn get_playlist(&self) -> Result<Vec<TrackDescriptor>>;

    /// Track at `index`
    ///
    /// Fails with `Error::IndexOutOfRange` when `index >= count`.
    fn get_song_info(&self, index: usize) -> Result<TrackDescriptor>;
}

/// Configured provider backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ProviderKind {
    #[default]
    Local,
    Spotify,
    Pandora,
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "spotify" => Ok(ProviderKind::Spotify),
            "pandora" => Ok(ProviderKind::Pandora),
            other => Err(Error::Config(format!(
                "Unknown music provider '{}' (expected Local, Spotify or Pandora)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Local => write!(f, "Local"),
            ProviderKind::Spotify => write!(f, "Spotify"),
            ProviderKind::Pandora => write!(f, "Pandora"),
        }
    }
}

/// Build the provider selected by the configuration
pub fn build_provider(config: &Config) -> Arc<dyn MusicProvider> {
    match config.provider {
        ProviderKind::Local => Arc::new(LocalMusicProvider::new(
            config.music_folder.clone(),
            config.extensions.clone(),
        )),
        ProviderKind::Spotify => Arc::new(SpotifyMusicProvider::new(config.spotify.clone())),
        ProviderKind::Pandora => Arc::new(PandoraMusicProvider::new(config.pandora.clone())),
    }
}
