//! # Music Shell Player Library (musicshell-player)
//!
//! Playlist playback with transport controls over HTTP.
//!
//! **Architecture:** a `PlaybackController` drives one output device at a
//! time (symphonia decode, rubato resample, cpal output) over a playlist
//! read from a `MusicProvider`; an axum router exposes it as a REST API
//! with an SSE event stream.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod provider;

pub use error::{Error, Result};
