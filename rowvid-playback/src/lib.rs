//! Playback engine: assembles frames queried from the row store and drives
//! timed advancement, seeking, and caching.
//!
//! A single event loop owns the state machine, the frame index, the tick
//! timer, and the cache; row fetches run as spawned tasks tagged with a
//! request token, and only the most recently issued token's result is
//! honored (last-request-wins).

mod cache;
mod controller;
mod session;

pub use cache::FrameCache;
pub use controller::{
    PlaybackCommand, PlaybackController, PlaybackEvent, PlaybackMetrics, PlaybackState,
};
pub use session::Session;
