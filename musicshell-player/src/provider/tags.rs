//! Tag reading for local files using lofty

use crate::error::{Error, Result};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::probe::Probe;
use std::path::Path;
use std::time::Duration;

/// Tags the player cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Duration,
}

/// Reads title/artist/duration from an audio file
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<TrackTags>;
}

/// Tag reader backed by lofty
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TrackTags> {
        let tagged_file = Probe::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open {}: {}", path.display(), e)))?
            .read()
            .map_err(|e| Error::Decode(format!("Failed to read tags from {}: {}", path.display(), e)))?;

        let duration = tagged_file.properties().duration();
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let (title, artist) = match tag {
            Some(tag) => (
                tag.title().map(|s| s.to_string()).filter(|s| !s.is_empty()),
                tag.artist().map(|s| s.to_string()).filter(|s| !s.is_empty()),
            ),
            None => (None, None),
        };

        Ok(TrackTags {
            title,
            artist,
            duration,
        })
    }
}
