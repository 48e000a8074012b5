//! Streaming-service providers
//!
//! Placeholders that hold their credentials and reject every call.

use super::MusicProvider;
use crate::config::{PandoraConfig, SpotifyConfig};
use crate::error::{Error, Result};
use musicshell_common::TrackDescriptor;

pub struct SpotifyMusicProvider {
    #[allow(dead_code)]
    config: SpotifyConfig,
}

impl SpotifyMusicProvider {
    pub fn new(config: SpotifyConfig) -> Self {
        Self { config }
    }

    fn unsupported() -> Error {
        Error::NotSupported("Spotify integration is not implemented yet".to_string())
    }
}

impl MusicProvider for SpotifyMusicProvider {
    fn name(&self) -> &'static str {
        "spotify"
    }

    fn get_playlist(&self) -> Result<Vec<TrackDescriptor>> {
        Err(Self::unsupported())
    }

    fn get_song_info(&self, _index: usize) -> Result<TrackDescriptor> {
        Err(Self::unsupported())
    }
}

pub struct PandoraMusicProvider {
    #[allow(dead_code)]
    config: PandoraConfig,
}

impl PandoraMusicProvider {
    pub fn new(config: PandoraConfig) -> Self {
        Self { config }
    }

    fn unsupported() -> Error {
        Error::NotSupported("Pandora integration is not implemented yet".to_string())
    }
}

impl MusicProvider for PandoraMusicProvider {
    fn name(&self) -> &'static str {
        "pandora"
    }

    fn get_playlist(&self) -> Result<Vec<TrackDescriptor>> {
        Err(Self::unsupported())
    }

    fn get_song_info(&self, _index: usize) -> Result<TrackDescriptor> {
        Err(Self::unsupported())
    }
}
