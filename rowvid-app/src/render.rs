//! Terminal frame rendering.

use rowvid_protocol::types::RasterFrame;

const RAMP: &[u8] = b" .:-=+*#%@";

/// Render a frame as ASCII art, one character per pixel, dark to bright.
pub fn ascii_frame(frame: &RasterFrame) -> String {
    let mut out = String::with_capacity(((frame.width + 1) * frame.height) as usize);
    for y in 0..frame.height {
        for x in 0..frame.width {
            let luminance = frame.get(x, y).luminance() as usize;
            let index = luminance * (RAMP.len() - 1) / 255;
            out.push(RAMP[index] as char);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use rowvid_protocol::types::Pixel;

    use super::*;

    #[test]
    fn black_renders_as_spaces_and_white_as_the_densest_glyph() {
        let black = RasterFrame::filled(0, 4, 2, Pixel::BLACK);
        assert_eq!(ascii_frame(&black), "    \n    \n");

        let white = RasterFrame::filled(0, 4, 2, Pixel::gray(255));
        assert_eq!(ascii_frame(&white), "@@@@\n@@@@\n");
    }

    #[test]
    fn one_line_per_pixel_row() {
        let frame = RasterFrame::filled(0, 3, 5, Pixel::gray(128));
        let rendered = ascii_frame(&frame);
        assert_eq!(rendered.lines().count(), 5);
        assert!(rendered.lines().all(|line| line.len() == 3));
    }
}
