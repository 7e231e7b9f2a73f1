//! Shared types for rowvid: the pixel-row schema, raster frames, video
//! metadata, encoder/playback configuration, and the error taxonomy.

pub mod config;
pub mod error;
pub mod metadata;
pub mod record;
pub mod types;
