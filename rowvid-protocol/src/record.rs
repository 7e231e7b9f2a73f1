//! The persisted pixel-row schema: typed records and the flat wire mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::VideoId;

/// Pixel-representation mode for an encoded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Sparse: only pixels brighter than the threshold are written, value 1.
    Binary,
    /// Dense: one row per pixel carrying its luminance.
    Grayscale,
    /// Dense: one row per pixel carrying an RGB triple.
    Color,
}

impl std::str::FromStr for Mode {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Mode::Binary),
            "grayscale" => Ok(Mode::Grayscale),
            "color" => Ok(Mode::Color),
            other => Err(crate::error::ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::Binary => "binary",
            Mode::Grayscale => "grayscale",
            Mode::Color => "color",
        })
    }
}

/// Mode-dependent payload of a pixel row.
///
/// A row carries either a scalar `value` or an `(r, g, b)` triple, never
/// both; the variants make that exclusivity a type-level invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelPayload {
    /// An "on" pixel in binary mode. The wire value is always 1; "off"
    /// pixels are never written at all.
    Binary,
    /// A luminance sample in grayscale mode (dense, including 0).
    Gray { value: u8 },
    /// An RGB sample in color mode (dense, including black).
    Color { r: u8, g: u8, b: u8 },
}

/// One persisted, immutable row describing a single pixel at a given frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRecord {
    pub video_id: VideoId,
    /// 0-based frame sequence index within the video.
    pub frame_id: u64,
    pub x: u32,
    pub y: u32,
    /// Encode timestamp, unix seconds.
    pub processed_at: u64,
    pub payload: PixelPayload,
}

/// Flat row as exchanged with the columnar store.
///
/// `value` and `(r, g, b)` are mutually exclusive; absent columns are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowValues {
    pub frame_id: u64,
    pub x: u32,
    pub y: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<u8>,
    pub video_id: String,
    pub processed_at: u64,
}

/// Errors when interpreting a flat row.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row carries both value and rgb columns")]
    BothPayloads,
    #[error("row carries neither value nor rgb columns")]
    MissingPayload,
    #[error("row carries a partial rgb triple")]
    PartialColor,
    #[error("row payload does not match {expected} mode")]
    ModeMismatch { expected: Mode },
}

impl PixelRecord {
    /// Flatten into the store's row schema.
    pub fn to_row(&self) -> RowValues {
        let (value, r, g, b) = match self.payload {
            PixelPayload::Binary => (Some(1), None, None, None),
            PixelPayload::Gray { value } => (Some(value), None, None, None),
            PixelPayload::Color { r, g, b } => (None, Some(r), Some(g), Some(b)),
        };
        RowValues {
            frame_id: self.frame_id,
            x: self.x,
            y: self.y,
            value,
            r,
            g,
            b,
            video_id: self.video_id.0.clone(),
            processed_at: self.processed_at,
        }
    }

    /// Interpret a flat row under the given mode.
    ///
    /// The same wire value decodes differently per mode (a bare `value = 1`
    /// is an "on" bit in binary mode but a near-black sample in grayscale),
    /// so the caller must supply the video's mode.
    pub fn from_row(row: &RowValues, mode: Mode) -> Result<Self, RowError> {
        let payload = match (row.value, row.r, row.g, row.b) {
            (Some(_), Some(_), _, _) | (Some(_), _, Some(_), _) | (Some(_), _, _, Some(_)) => {
                return Err(RowError::BothPayloads);
            }
            (None, None, None, None) => return Err(RowError::MissingPayload),
            (Some(value), None, None, None) => match mode {
                Mode::Binary => PixelPayload::Binary,
                Mode::Grayscale => PixelPayload::Gray { value },
                Mode::Color => return Err(RowError::ModeMismatch { expected: mode }),
            },
            (None, Some(r), Some(g), Some(b)) => match mode {
                Mode::Color => PixelPayload::Color { r, g, b },
                _ => return Err(RowError::ModeMismatch { expected: mode }),
            },
            (None, _, _, _) => return Err(RowError::PartialColor),
        };

        Ok(Self {
            video_id: VideoId(row.video_id.clone()),
            frame_id: row.frame_id,
            x: row.x,
            y: row.y,
            processed_at: row.processed_at,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: PixelPayload) -> PixelRecord {
        PixelRecord {
            video_id: VideoId::from("test-video"),
            frame_id: 3,
            x: 7,
            y: 2,
            processed_at: 1_700_000_000,
            payload,
        }
    }

    #[test]
    fn binary_row_roundtrip() {
        let rec = record(PixelPayload::Binary);
        let row = rec.to_row();
        assert_eq!(row.value, Some(1));
        assert_eq!((row.r, row.g, row.b), (None, None, None));
        assert_eq!(PixelRecord::from_row(&row, Mode::Binary).unwrap(), rec);
    }

    #[test]
    fn gray_row_roundtrip_including_zero() {
        for value in [0u8, 1, 128, 255] {
            let rec = record(PixelPayload::Gray { value });
            let row = rec.to_row();
            assert_eq!(row.value, Some(value));
            assert_eq!(PixelRecord::from_row(&row, Mode::Grayscale).unwrap(), rec);
        }
    }

    #[test]
    fn color_row_roundtrip() {
        let rec = record(PixelPayload::Color { r: 10, g: 20, b: 30 });
        let row = rec.to_row();
        assert_eq!(row.value, None);
        assert_eq!((row.r, row.g, row.b), (Some(10), Some(20), Some(30)));
        assert_eq!(PixelRecord::from_row(&row, Mode::Color).unwrap(), rec);
    }

    #[test]
    fn row_with_both_payloads_rejected() {
        let mut row = record(PixelPayload::Binary).to_row();
        row.r = Some(5);
        assert_eq!(
            PixelRecord::from_row(&row, Mode::Binary),
            Err(RowError::BothPayloads)
        );
    }

    #[test]
    fn row_with_no_payload_rejected() {
        let mut row = record(PixelPayload::Binary).to_row();
        row.value = None;
        assert_eq!(
            PixelRecord::from_row(&row, Mode::Binary),
            Err(RowError::MissingPayload)
        );
    }

    #[test]
    fn partial_color_rejected() {
        let mut row = record(PixelPayload::Color { r: 1, g: 2, b: 3 }).to_row();
        row.b = None;
        assert_eq!(
            PixelRecord::from_row(&row, Mode::Color),
            Err(RowError::PartialColor)
        );
    }

    #[test]
    fn scalar_row_under_color_mode_rejected() {
        let row = record(PixelPayload::Gray { value: 9 }).to_row();
        assert_eq!(
            PixelRecord::from_row(&row, Mode::Color),
            Err(RowError::ModeMismatch {
                expected: Mode::Color
            })
        );
    }

    #[test]
    fn absent_columns_omitted_from_json() {
        let row = record(PixelPayload::Binary).to_row();
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"value\":1"));
        assert!(!json.contains("\"r\":"));
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("binary".parse::<Mode>().unwrap(), Mode::Binary);
        assert_eq!("grayscale".parse::<Mode>().unwrap(), Mode::Grayscale);
        assert_eq!("color".parse::<Mode>().unwrap(), Mode::Color);
        assert!("sepia".parse::<Mode>().is_err());
    }
}
