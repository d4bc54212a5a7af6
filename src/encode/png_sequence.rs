use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tiny_skia::{IntSize, Pixmap};

use super::FrameSink;

/// Writes each frame as `frame_000000.png`, `frame_000001.png`, ...
pub struct PngSequence {
    dir: PathBuf,
    size: IntSize,
    next: u64,
}

impl PngSequence {
    pub fn new(dir: &Path, width: u32, height: u32) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create frames directory: {}", dir.display()))?;
        let size = IntSize::from_wh(width, height)
            .with_context(|| format!("Invalid frame size {}x{}", width, height))?;
        log::info!("Writing PNG frames to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            size,
            next: 0,
        })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }
}

impl FrameSink for PngSequence {
    fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        // frames are opaque, so straight and premultiplied RGBA coincide
        let pixmap = Pixmap::from_vec(rgba_pixels.to_vec(), self.size)
            .context("Frame does not match the sequence size")?;
        let path = self.frame_path(self.next);
        pixmap
            .save_png(&path)
            .with_context(|| format!("Failed to write frame: {}", path.display()))?;
        self.next += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        log::info!("Wrote {} frames to {}", self.next, self.dir.display());
        Ok(())
    }
}
