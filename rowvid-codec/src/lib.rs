//! Frame codec: raster frames to pixel rows and back.
//!
//! The encode path turns one raster frame into a set of [`PixelRecord`]s
//! according to the configured mode; the assembly path turns a queried row
//! set back into a dense [`RasterFrame`] for rendering. The two directions
//! share only the row schema.
//!
//! [`PixelRecord`]: rowvid_protocol::record::PixelRecord
//! [`RasterFrame`]: rowvid_protocol::types::RasterFrame

mod assembler;
mod encoder;
mod resize;

pub use assembler::assemble;
pub use encoder::Encoder;
pub use resize::resize_nearest;
