//! Playlist playback
//!
//! - `controller`: transport operations, queries and lifecycle
//! - `reactor`: auto-advance on natural track completion
//! - `status`: user-facing transport results

mod controller;
mod reactor;
mod status;

pub use controller::PlaybackController;
pub use status::{TransportOp, TransportStatus};
