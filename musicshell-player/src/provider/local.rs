//! Local filesystem provider
//!
//! Lists audio files in a single folder (non-recursive), ordered by path.
//! The folder is rescanned on every call so files added or removed while
//! the player runs show up on the next transport command.

use super::tags::{LoftyTagReader, TagReader, TrackTags};
use super::MusicProvider;
use crate::error::{Error, Result};
use musicshell_common::track::UNKNOWN_ARTIST;
use musicshell_common::TrackDescriptor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LocalMusicProvider {
    folder: PathBuf,
    extensions: Vec<String>,
    tag_reader: Arc<dyn TagReader>,
}

impl LocalMusicProvider {
    /// Provider reading tags with lofty
    pub fn new(folder: PathBuf, extensions: Vec<String>) -> Self {
        Self::with_tag_reader(folder, extensions, Arc::new(LoftyTagReader))
    }

    pub fn with_tag_reader(
        folder: PathBuf,
        extensions: Vec<String>,
        tag_reader: Arc<dyn TagReader>,
    ) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            folder,
            extensions,
            tag_reader,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Audio files in the folder, sorted by path
    ///
    /// A missing or unreadable folder is an empty playlist, not an error.
    fn scan(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read music folder {}: {}", self.folder.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.has_audio_extension(path))
            .collect();
        files.sort();

        debug!("Found {} audio files in {}", files.len(), self.folder.display());
        files
    }

    fn has_audio_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|wanted| *wanted == ext)
            })
            .unwrap_or(false)
    }

    /// Build a descriptor, falling back to the file stem and "Unknown Artist"
    /// when tags are missing or unreadable
    fn describe(&self, path: &Path) -> TrackDescriptor {
        let tags = self.tag_reader.read(path).unwrap_or_else(|e| {
            debug!("Using default tags for {}: {}", path.display(), e);
            TrackTags::default()
        });

        let title = tags.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        TrackDescriptor::new(
            title,
            path,
            tags.duration,
            tags.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        )
    }
}

impl MusicProvider for LocalMusicProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn get_playlist(&self) -> Result<Vec<TrackDescriptor>> {
        Ok(self.scan().iter().map(|path| self.describe(path)).collect())
    }

    fn get_song_info(&self, index: usize) -> Result<TrackDescriptor> {
        let files = self.scan();
        let path = files.get(index).ok_or(Error::IndexOutOfRange {
            index: index as i64,
            count: files.len(),
        })?;
        Ok(self.describe(path))
    }
}
