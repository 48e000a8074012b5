//! In-memory playlist source

use musicshell_player::provider::MusicProvider;
use musicshell_player::{Error, Result};
use musicshell_common::TrackDescriptor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Track named `title` at `/music/<title>.mp3`
pub fn track(title: &str) -> TrackDescriptor {
    TrackDescriptor::new(
        title,
        PathBuf::from(format!("/music/{}.mp3", title)),
        Duration::from_secs(185),
        "Test Artist",
    )
}

pub struct InMemoryProvider {
    tracks: Mutex<Vec<TrackDescriptor>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryProvider {
    pub fn with_titles(titles: &[&str]) -> Self {
        Self {
            tracks: Mutex::new(titles.iter().map(|t| track(t)).collect()),
            failing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// Replace the playlist
    pub fn set_titles(&self, titles: &[&str]) {
        *self.tracks.lock().unwrap() = titles.iter().map(|t| track(t)).collect();
    }

    /// Make every read fail with an I/O error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl MusicProvider for InMemoryProvider {
    fn name(&self) -> &'static str {
        "InMemory"
    }

    fn get_playlist(&self) -> Result<Vec<TrackDescriptor>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "music folder unreadable",
            )));
        }
        Ok(self.tracks.lock().unwrap().clone())
    }

    fn get_song_info(&self, index: usize) -> Result<TrackDescriptor> {
        let playlist = self.get_playlist()?;
        let count = playlist.len();
        playlist.into_iter().nth(index).ok_or(Error::IndexOutOfRange {
            index: index as i64,
            count,
        })
    }
}
