//! Nearest-neighbor resampling.
//!
//! Chosen for determinism and speed over quality: the mapping is pure
//! integer arithmetic, so identical inputs always produce byte-identical
//! output.

use rowvid_protocol::types::RasterFrame;

/// Resize `frame` to `(target_width, target_height)` by nearest-neighbor.
///
/// Each target pixel `(x, y)` samples the source at
/// `(x * src_w / dst_w, y * src_h / dst_h)` (integer division).
pub fn resize_nearest(frame: &RasterFrame, target_width: u32, target_height: u32) -> RasterFrame {
    if frame.width == target_width && frame.height == target_height {
        return frame.clone();
    }

    let mut pixels = Vec::with_capacity((target_width * target_height) as usize);
    for y in 0..target_height {
        let sy = (y as u64 * frame.height as u64 / target_height as u64) as u32;
        for x in 0..target_width {
            let sx = (x as u64 * frame.width as u64 / target_width as u64) as u32;
            pixels.push(frame.get(sx, sy));
        }
    }

    RasterFrame {
        frame_id: frame.frame_id,
        width: target_width,
        height: target_height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use rowvid_protocol::types::Pixel;

    use super::*;

    fn gradient_frame(width: u32, height: u32) -> RasterFrame {
        let mut frame = RasterFrame::filled(0, width, height, Pixel::BLACK);
        for y in 0..height {
            for x in 0..width {
                frame.set(x, y, Pixel::gray(((x + y) % 256) as u8));
            }
        }
        frame
    }

    #[test]
    fn identity_resize_is_a_copy() {
        let frame = gradient_frame(8, 6);
        assert_eq!(resize_nearest(&frame, 8, 6), frame);
    }

    #[test]
    fn downscale_samples_expected_pixels() {
        // 4x4 -> 2x2 samples source (0,0), (2,0), (0,2), (2,2).
        let mut frame = RasterFrame::filled(0, 4, 4, Pixel::BLACK);
        frame.set(0, 0, Pixel::gray(10));
        frame.set(2, 0, Pixel::gray(20));
        frame.set(0, 2, Pixel::gray(30));
        frame.set(2, 2, Pixel::gray(40));

        let small = resize_nearest(&frame, 2, 2);
        assert_eq!(small.get(0, 0), Pixel::gray(10));
        assert_eq!(small.get(1, 0), Pixel::gray(20));
        assert_eq!(small.get(0, 1), Pixel::gray(30));
        assert_eq!(small.get(1, 1), Pixel::gray(40));
    }

    #[test]
    fn upscale_replicates_pixels() {
        let mut frame = RasterFrame::filled(0, 2, 1, Pixel::BLACK);
        frame.set(0, 0, Pixel::gray(100));
        frame.set(1, 0, Pixel::gray(200));

        let big = resize_nearest(&frame, 4, 2);
        assert_eq!(big.get(0, 0), Pixel::gray(100));
        assert_eq!(big.get(1, 0), Pixel::gray(100));
        assert_eq!(big.get(2, 0), Pixel::gray(200));
        assert_eq!(big.get(3, 1), Pixel::gray(200));
    }

    #[test]
    fn resize_is_deterministic() {
        let frame = gradient_frame(33, 17);
        let a = resize_nearest(&frame, 16, 9);
        let b = resize_nearest(&frame, 16, 9);
        assert_eq!(a, b);
    }
}
