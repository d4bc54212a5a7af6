use std::path::Path;

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use tiny_skia::{ColorU8, Pixmap, Transform};

use super::surface::Surface;

const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Baseline {
    Top,
    Middle,
    Alphabetic,
}

#[derive(Clone, Copy, Debug)]
pub struct TextStyle {
    /// Font size in logical pixels
    pub size: f32,
    pub color: ColorU8,
    pub opacity: f32,
    pub align: Align,
    pub baseline: Baseline,
    /// Clockwise rotation in degrees around the anchor
    pub rotation: f32,
}

impl TextStyle {
    pub fn new(size: f32, color: ColorU8, opacity: f32) -> Self {
        Self {
            size,
            color,
            opacity,
            align: Align::Left,
            baseline: Baseline::Alphabetic,
            rotation: 0.0,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }
}

pub struct TextPainter {
    font: Font,
}

impl TextPainter {
    /// Painter backed by the bundled DejaVu Sans.
    pub fn embedded() -> Result<Self> {
        let font = Font::from_bytes(FONT_DATA, FontSettings::default())
            .map_err(anyhow::Error::msg)
            .context("Failed to load embedded font")?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to parse font: {}", path.display()))?;
        Ok(Self { font })
    }

    /// Measure the advance width of `text` in pixels at `size`.
    pub fn measure_width(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, size).advance_width)
            .sum()
    }

    /// Draw `text` anchored at logical `(x, y)`.
    pub fn draw(&self, surface: &mut Surface, text: &str, x: f32, y: f32, style: &TextStyle) {
        let px = style.size * surface.dpr();
        let Some(label) = self.rasterize(text, px, style.color, style.opacity) else {
            return;
        };

        let ax = match style.align {
            Align::Left => 0.0,
            Align::Center => -label.width / 2.0,
            Align::Right => -label.width,
        };
        let ay = match style.baseline {
            Baseline::Top => 0.0,
            Baseline::Middle => -label.height / 2.0,
            Baseline::Alphabetic => -label.ascent,
        };

        let dpr = surface.dpr();
        let transform = Transform::from_translate(x * dpr, y * dpr)
            .pre_rotate(style.rotation)
            .pre_translate(ax, ay);
        surface.draw_pixmap(label.pixmap.as_ref(), transform);
    }

    fn rasterize(&self, text: &str, px: f32, color: ColorU8, opacity: f32) -> Option<RasterLabel> {
        if text.is_empty() || !(px.is_finite() && px > 0.0) {
            return None;
        }
        let (ascent, descent) = match self.font.horizontal_line_metrics(px) {
            Some(m) => (m.ascent, m.descent),
            None => (px, 0.0),
        };
        let width = self.measure_width(text, px).ceil();
        let height = (ascent - descent).ceil();
        let mut pixmap = Pixmap::new(width.max(1.0) as u32, height.max(1.0) as u32)?;
        let (pw, ph) = (pixmap.width() as i32, pixmap.height() as i32);
        let alpha = color.alpha() as f32 * opacity.clamp(0.0, 1.0) / 255.0;

        let mut cursor = 0.0f32;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, px);
            let left = cursor.round() as i32 + metrics.xmin;
            let top = (ascent.round() as i32) - (metrics.height as i32 + metrics.ymin);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let (tx, ty) = (left + gx as i32, top + gy as i32);
                    if tx < 0 || ty < 0 || tx >= pw || ty >= ph {
                        continue;
                    }
                    let a = (coverage as f32 * alpha).round().clamp(0.0, 255.0) as u8;
                    let idx = (ty * pw + tx) as usize;
                    let pixels = pixmap.pixels_mut();
                    if a > pixels[idx].alpha() {
                        pixels[idx] = ColorU8::from_rgba(color.red(), color.green(), color.blue(), a)
                            .premultiply();
                    }
                }
            }

            cursor += metrics.advance_width;
        }

        Some(RasterLabel {
            pixmap,
            width,
            height,
            ascent,
        })
    }
}

struct RasterLabel {
    pixmap: Pixmap,
    width: f32,
    height: f32,
    ascent: f32,
}
