//! # Music Shell Common Library
//!
//! Shared code for the Music Shell services including:
//! - Track descriptors and their API representation
//! - Player event types (PlayerEvent enum)
//! - Music folder resolution
//! - Duration formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod track;

pub use error::{Error, Result};
pub use track::{SongInfoDto, TrackDescriptor};
