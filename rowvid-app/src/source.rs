//! Frame sources for the encode path.
//!
//! A real deployment would back [`FrameSource`] with a video decoder; the
//! in-tree [`SyntheticSource`] generates a deterministic test pattern and
//! stands in for one in demos and tests.

use rowvid_protocol::error::SourceError;
use rowvid_protocol::types::{Pixel, RasterFrame};

/// A sequence of decoded raster frames at a fixed frame rate.
pub trait FrameSource {
    /// Frame rate of the underlying material.
    fn fps(&self) -> f64;

    /// The next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RasterFrame>, SourceError>;
}

/// Deterministic test-pattern source: a diagonal gradient that sweeps one
/// step further each frame, so consecutive frames differ and re-runs are
/// identical.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    fps: f64,
    total_frames: u64,
    next_frame_id: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, fps: f64, total_frames: u64) -> Self {
        Self {
            width,
            height,
            fps,
            total_frames,
            next_frame_id: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<RasterFrame>, SourceError> {
        if self.next_frame_id >= self.total_frames {
            return Ok(None);
        }
        let frame_id = self.next_frame_id;
        self.next_frame_id += 1;

        let mut frame = RasterFrame::filled(frame_id, self.width, self.height, Pixel::BLACK);
        for y in 0..self.height {
            for x in 0..self.width {
                let value = ((x as u64 + y as u64 + 8 * frame_id) % 256) as u8;
                frame.set(x, y, Pixel::gray(value));
            }
        }
        Ok(Some(frame))
    }
}
