//! Row set to dense raster frame assembly.

use rowvid_protocol::error::AssembleError;
use rowvid_protocol::record::{Mode, PixelPayload, PixelRecord, RowValues};
use rowvid_protocol::types::{Pixel, RasterFrame};

/// Assemble a queried row set into a dense `width x height` frame.
///
/// The buffer starts as all-background (black); each row writes its value
/// at `(x, y)`. Malformed or out-of-range rows are skipped and logged, never
/// aborting assembly — an empty row set is a normal outcome (a fully "off"
/// binary frame) and yields an all-background frame.
///
/// Binary "on" rows assemble to full white so the result is directly
/// renderable. Pure: the same rows, dimensions, and mode always produce
/// byte-identical output.
pub fn assemble(
    rows: &[RowValues],
    width: u32,
    height: u32,
    mode: Mode,
    frame_id: u64,
) -> RasterFrame {
    let mut frame = RasterFrame::filled(frame_id, width, height, Pixel::BLACK);
    let mut skipped = 0usize;

    for row in rows {
        match place_row(&mut frame, row, mode) {
            Ok(()) => {}
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    frame_id,
                    x = row.x,
                    y = row.y,
                    error = %e,
                    "skipping bad row during assembly"
                );
            }
        }
    }

    tracing::debug!(
        frame_id,
        rows = rows.len(),
        skipped,
        "frame assembled"
    );

    frame
}

fn place_row(frame: &mut RasterFrame, row: &RowValues, mode: Mode) -> Result<(), AssembleError> {
    let record = PixelRecord::from_row(row, mode)?;

    if record.x >= frame.width || record.y >= frame.height {
        return Err(AssembleError::OutOfBounds {
            x: record.x,
            y: record.y,
            width: frame.width,
            height: frame.height,
        });
    }

    let pixel = match record.payload {
        PixelPayload::Binary => Pixel::gray(255),
        PixelPayload::Gray { value } => Pixel::gray(value),
        PixelPayload::Color { r, g, b } => Pixel::new(r, g, b),
    };
    frame.set(record.x, record.y, pixel);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(x: u32, y: u32, value: Option<u8>, rgb: Option<(u8, u8, u8)>) -> RowValues {
        RowValues {
            frame_id: 0,
            x,
            y,
            value,
            r: rgb.map(|c| c.0),
            g: rgb.map(|c| c.1),
            b: rgb.map(|c| c.2),
            video_id: "test-video".to_string(),
            processed_at: 0,
        }
    }

    #[test]
    fn empty_row_set_yields_background_frame() {
        let frame = assemble(&[], 2, 2, Mode::Binary, 1);
        assert_eq!(frame.frame_id, 1);
        assert!(frame.pixels.iter().all(|p| *p == Pixel::BLACK));
    }

    #[test]
    fn gray_rows_land_at_their_coordinates() {
        let rows = vec![row(0, 0, Some(10), None), row(1, 1, Some(200), None)];
        let frame = assemble(&rows, 2, 2, Mode::Grayscale, 0);
        assert_eq!(frame.get(0, 0), Pixel::gray(10));
        assert_eq!(frame.get(1, 1), Pixel::gray(200));
        assert_eq!(frame.get(1, 0), Pixel::BLACK);
    }

    #[test]
    fn out_of_bounds_rows_skipped_not_fatal() {
        let rows = vec![
            row(0, 0, Some(50), None),
            row(2, 0, Some(99), None),
            row(0, 7, Some(99), None),
        ];
        let frame = assemble(&rows, 2, 2, Mode::Grayscale, 0);
        assert_eq!(frame.get(0, 0), Pixel::gray(50));
        // Everything else untouched.
        assert_eq!(frame.get(1, 0), Pixel::BLACK);
        assert_eq!(frame.get(0, 1), Pixel::BLACK);
        assert_eq!(frame.get(1, 1), Pixel::BLACK);
    }

    #[test]
    fn malformed_rows_skipped_not_fatal() {
        // Carries both payload shapes.
        let mut bad = row(0, 0, Some(1), Some((1, 2, 3)));
        bad.value = Some(1);
        let rows = vec![bad, row(1, 0, Some(80), None)];
        let frame = assemble(&rows, 2, 1, Mode::Grayscale, 0);
        assert_eq!(frame.get(0, 0), Pixel::BLACK);
        assert_eq!(frame.get(1, 0), Pixel::gray(80));
    }

    #[test]
    fn color_rows_preserve_channels() {
        let rows = vec![row(1, 0, None, Some((7, 8, 9)))];
        let frame = assemble(&rows, 2, 1, Mode::Color, 0);
        assert_eq!(frame.get(1, 0), Pixel::new(7, 8, 9));
    }

    #[test]
    fn assembly_is_pure() {
        let rows = vec![row(0, 0, Some(1), None), row(1, 1, Some(1), None)];
        let a = assemble(&rows, 2, 2, Mode::Binary, 0);
        let b = assemble(&rows, 2, 2, Mode::Binary, 0);
        assert_eq!(a, b);
    }
}
