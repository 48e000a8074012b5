//! REST API for the music player
//!
//! Thin adapter over `PlaybackController`: every handler calls exactly one
//! controller operation and maps its result to JSON.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
