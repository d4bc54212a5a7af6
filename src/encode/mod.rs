pub mod ffmpeg;
pub mod png_sequence;

use anyhow::Result;

/// Destination for rendered frames, fed opaque RGBA in render order.
pub trait FrameSink {
    fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()>;

    /// Flush and close the output.
    fn finish(self: Box<Self>) -> Result<()>;
}
