//! Raster frame to pixel-row encoding.

use std::time::{SystemTime, UNIX_EPOCH};

use rowvid_protocol::config::EncoderConfig;
use rowvid_protocol::error::ConfigError;
use rowvid_protocol::record::{Mode, PixelPayload, PixelRecord};
use rowvid_protocol::types::{RasterFrame, VideoId};

use crate::resize::resize_nearest;

/// Encodes raster frames into pixel rows according to one job's config.
///
/// Construction validates the config, so an `Encoder` that exists has
/// already rejected bad parameters. All records of one encoder share a
/// single `processed_at` stamp taken at construction; encoding is therefore
/// deterministic for the lifetime of the encoder.
pub struct Encoder {
    config: EncoderConfig,
    video_id: VideoId,
    processed_at: u64,
}

impl Encoder {
    /// Validate `config` and create an encoder.
    pub fn new(config: EncoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let video_id = VideoId(config.url.clone());
        let processed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        tracing::info!(
            video_id = %video_id,
            width = config.target_width,
            height = config.target_height,
            mode = %config.mode,
            threshold = config.threshold,
            max_duration_secs = config.max_duration_secs,
            "encoder created"
        );

        Ok(Self {
            config,
            video_id,
            processed_at,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    /// Encode one frame into its pixel rows.
    ///
    /// `timestamp_secs` is the frame's offset from video start; frames past
    /// the configured duration cap return an empty set (the job truncates,
    /// it does not fail). Binary mode writes a row only for pixels strictly
    /// brighter than the threshold; grayscale and color write one row per
    /// pixel.
    pub fn encode(&self, frame: &RasterFrame, timestamp_secs: f64) -> Vec<PixelRecord> {
        if timestamp_secs > self.config.max_duration_secs as f64 {
            tracing::trace!(
                frame_id = frame.frame_id,
                timestamp_secs,
                max_duration_secs = self.config.max_duration_secs,
                "frame past duration cap, dropped"
            );
            return Vec::new();
        }

        let fitted = resize_nearest(frame, self.config.target_width, self.config.target_height);

        let mut records = Vec::new();
        for y in 0..fitted.height {
            for x in 0..fitted.width {
                let pixel = fitted.get(x, y);
                let payload = match self.config.mode {
                    Mode::Binary => {
                        if pixel.luminance() > self.config.threshold {
                            PixelPayload::Binary
                        } else {
                            continue;
                        }
                    }
                    Mode::Grayscale => PixelPayload::Gray {
                        value: pixel.luminance(),
                    },
                    Mode::Color => PixelPayload::Color {
                        r: pixel.r,
                        g: pixel.g,
                        b: pixel.b,
                    },
                };
                records.push(PixelRecord {
                    video_id: self.video_id.clone(),
                    frame_id: frame.frame_id,
                    x,
                    y,
                    processed_at: self.processed_at,
                    payload,
                });
            }
        }

        tracing::debug!(
            frame_id = frame.frame_id,
            records = records.len(),
            "frame encoded"
        );

        records
    }
}
