//! Video metadata derived from store aggregates.
//!
//! Metadata is never persisted as its own table; it is recomputed from the
//! pixel rows on demand.

use serde::{Deserialize, Serialize};

use crate::record::Mode;
use crate::types::VideoId;

/// Aggregates computed by the store over one video's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateMetadata {
    pub max_x: u32,
    pub max_y: u32,
    pub distinct_frame_count: u64,
    /// Whether any row carries an rgb triple.
    pub has_color: bool,
    /// Largest scalar `value` observed, if any scalar rows exist.
    pub max_value: Option<u8>,
}

/// Derived playback metadata for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: VideoId,
    pub width: u32,
    pub height: u32,
    pub total_frames: u64,
    pub mode: Mode,
}

impl VideoMetadata {
    /// Derive metadata from store aggregates.
    ///
    /// Mode inference: color if any rgb column is present, binary if every
    /// observed scalar value is 0 or 1, grayscale otherwise.
    pub fn derive(video_id: VideoId, agg: &AggregateMetadata) -> Self {
        let mode = if agg.has_color {
            Mode::Color
        } else if agg.max_value.is_none_or(|v| v <= 1) {
            Mode::Binary
        } else {
            Mode::Grayscale
        };

        Self {
            video_id,
            width: agg.max_x + 1,
            height: agg.max_y + 1,
            total_frames: agg.distinct_frame_count,
            mode,
        }
    }
}
