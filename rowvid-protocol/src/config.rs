//! Encoder and playback configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::Mode;

/// Minimum accepted target width.
pub const MIN_TARGET_WIDTH: u32 = 16;

/// Minimum accepted target height.
pub const MIN_TARGET_HEIGHT: u32 = 9;

/// Minimum accepted encode duration cap in seconds.
pub const MIN_MAX_DURATION_SECS: u32 = 1;

/// Encoder configuration.
///
/// `threshold` is typed `u8`, so the 0–255 range is enforced by
/// construction; everything else is checked by [`EncoderConfig::validate`]
/// before any frame is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Source video URL; doubles as the `video_id` grouping key.
    pub url: String,
    #[serde(default = "default_target_width")]
    pub target_width: u32,
    #[serde(default = "default_target_height")]
    pub target_height: u32,
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Luminance threshold for binary mode; pixels strictly brighter are
    /// written, the rest are omitted.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Frames past this many seconds from video start are dropped silently.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u32,
}

fn default_target_width() -> u32 {
    160
}

fn default_target_height() -> u32 {
    90
}

fn default_mode() -> Mode {
    Mode::Binary
}

fn default_threshold() -> u8 {
    128
}

fn default_max_duration() -> u32 {
    10
}

impl EncoderConfig {
    /// A config with default dimensions/mode for the given source URL.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target_width: default_target_width(),
            target_height: default_target_height(),
            mode: default_mode(),
            threshold: default_threshold(),
            max_duration_secs: default_max_duration(),
        }
    }

    /// Reject invalid parameters before any frame is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_width < MIN_TARGET_WIDTH {
            return Err(ConfigError::TargetWidthTooSmall {
                got: self.target_width,
                min: MIN_TARGET_WIDTH,
            });
        }
        if self.target_height < MIN_TARGET_HEIGHT {
            return Err(ConfigError::TargetHeightTooSmall {
                got: self.target_height,
                min: MIN_TARGET_HEIGHT,
            });
        }
        if self.max_duration_secs < MIN_MAX_DURATION_SECS {
            return Err(ConfigError::MaxDurationTooSmall {
                got: self.max_duration_secs,
                min: MIN_MAX_DURATION_SECS,
            });
        }
        Ok(())
    }
}

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Tick rate driving frame advancement; the tick interval is
    /// `1000 / fps` milliseconds.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Maximum number of assembled frames held in the LRU cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Per-query timeout; on expiry the pending fetch is abandoned and
    /// playback pauses with a reported store error.
    #[serde(default = "default_query_timeout", with = "duration_millis")]
    pub query_timeout: Duration,
}

fn default_fps() -> u32 {
    30
}

fn default_cache_capacity() -> usize {
    64
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            cache_capacity: default_cache_capacity(),
            query_timeout: default_query_timeout(),
        }
    }
}

impl PlaybackConfig {
    /// Interval between playback ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EncoderConfig::for_url("file:///tmp/a.mp4").validate().is_ok());
    }

    #[test]
    fn width_below_minimum_rejected() {
        let mut cfg = EncoderConfig::for_url("u");
        cfg.target_width = 8;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TargetWidthTooSmall { got: 8, min: 16 })
        ));
    }

    #[test]
    fn height_below_minimum_rejected() {
        let mut cfg = EncoderConfig::for_url("u");
        cfg.target_height = 8;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TargetHeightTooSmall { got: 8, min: 9 })
        ));
    }

    #[test]
    fn zero_duration_rejected() {
        let mut cfg = EncoderConfig::for_url("u");
        cfg.max_duration_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tick_interval_from_fps() {
        let cfg = PlaybackConfig {
            fps: 25,
            ..Default::default()
        };
        assert_eq!(cfg.tick_interval(), Duration::from_millis(40));
    }
}
