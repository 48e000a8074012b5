//! Error types for musicshell-player
//!
//! Each failure class the player distinguishes gets its own variant so the
//! HTTP layer can map it to a status code without string matching.

use thiserror::Error;

/// Main error type for musicshell-player
#[derive(Error, Debug)]
pub enum Error {
    /// The transition lock could not be acquired in time (retryable)
    #[error("Player is busy, timed out after {0:?} waiting for the transition lock")]
    LockTimeout(std::time::Duration),

    /// Playlist index outside `0..count`
    #[error("Index {index} is out of range for a playlist of {count} songs")]
    IndexOutOfRange { index: i64, count: usize },

    /// Operation needs at least one track
    #[error("No songs available in the playlist")]
    EmptyPlaylist,

    /// Nothing is playing or paused
    #[error("No song is currently playing")]
    NoCurrentSong,

    /// Reading the playlist failed
    #[error("Failed to read playlist: {source}")]
    PlaylistRead {
        #[source]
        source: Box<Error>,
    },

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    Device(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Music provider backend that has no implementation
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Controller has been disposed
    #[error("Player has been shut down")]
    Disposed,

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the common crate
    #[error(transparent)]
    Common(#[from] musicshell_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a failure from the playlist source, keeping the original cause
    pub fn playlist_read(source: Error) -> Self {
        Error::PlaylistRead {
            source: Box::new(source),
        }
    }
}

/// Convenience Result type using musicshell-player Error
pub type Result<T> = std::result::Result<T, Error>;
