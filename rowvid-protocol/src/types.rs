//! Core types shared across all rowvid crates.

use serde::{Deserialize, Serialize};

/// Opaque grouping key for all rows belonging to one video.
///
/// Typically the source URL, but the store treats it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single RGB pixel sample (8 bits per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A gray pixel with all three channels set to `value`.
    pub fn gray(value: u8) -> Self {
        Self {
            r: value,
            g: value,
            b: value,
        }
    }

    /// BT.601 luminance of this pixel.
    pub fn luminance(&self) -> u8 {
        let y = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        y.round().clamp(0.0, 255.0) as u8
    }
}

/// An in-memory dense pixel buffer for one video frame.
///
/// Exists only transiently: produced by a frame source on the encode path or
/// by the assembler on the playback path, never persisted as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    /// 0-based sequence index within the video.
    pub frame_id: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row-major pixel data, `width * height` entries.
    pub pixels: Vec<Pixel>,
}

impl RasterFrame {
    /// Create a frame filled with a single pixel value.
    pub fn filled(frame_id: u64, width: u32, height: u32, fill: Pixel) -> Self {
        Self {
            frame_id,
            width,
            height,
            pixels: vec![fill; (width * height) as usize],
        }
    }

    /// Get the pixel at `(x, y)`. Panics if out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at `(x, y)`. Panics if out of bounds.
    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[(y * self.width + x) as usize] = pixel;
    }
}
