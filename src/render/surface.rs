use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path as FsPath;

use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Paint, Path, Pixmap, PixmapPaint, PixmapRef, Rect,
    Stroke, Transform,
};

use super::palette::{opaque, with_alpha};

/// Largest pixel dimension a surface may allocate.
const MAX_PIXELS: f32 = 16384.0;
/// Widened translucent copies drawn under a shape to fake a blur shadow.
const GLOW_LAYERS: usize = 3;
/// Total alpha budget shared by the glow layers.
const GLOW_STRENGTH: f32 = 0.35;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("invalid surface size {width}x{height} at {dpr}x")]
    InvalidSize { width: f32, height: f32, dpr: f32 },
    #[error("failed to encode PNG {path}: {reason}")]
    Png { path: String, reason: String },
}

/// A device-pixel-ratio aware raster target.
///
/// All drawing calls take logical (CSS-like) coordinates; the backing pixmap
/// is `ceil(logical · dpr)` pixels in each direction.
pub struct Surface {
    pixmap: Pixmap,
    width: f32,
    height: f32,
    dpr: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32, dpr: f32) -> Result<Self, SurfaceError> {
        let invalid = || SurfaceError::InvalidSize { width, height, dpr };
        if !(width.is_finite() && height.is_finite() && dpr.is_finite()) {
            return Err(invalid());
        }
        if width < 0.0 || height < 0.0 || dpr <= 0.0 {
            return Err(invalid());
        }
        let pw = (width * dpr).ceil().max(1.0);
        let ph = (height * dpr).ceil().max(1.0);
        if pw > MAX_PIXELS || ph > MAX_PIXELS {
            return Err(invalid());
        }
        let pixmap = Pixmap::new(pw as u32, ph as u32).ok_or_else(invalid)?;
        Ok(Self {
            pixmap,
            width,
            height,
            dpr,
        })
    }

    /// Reallocate for a new container size; contents are cleared.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        *self = Self::new(width, height, dpr)?;
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn dpr(&self) -> f32 {
        self.dpr
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Logical → device transform.
    pub fn transform(&self) -> Transform {
        Transform::from_scale(self.dpr, self.dpr)
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Paint a (usually translucent) color over the whole surface.
    pub fn wash(&mut self, color: Color) {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = false;
        self.fill_rect(0.0, 0.0, self.width, self.height, &paint);
    }

    /// Fill a rectangle; negative extents are normalized, empty ones skipped.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
        let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let transform = self.transform();
            self.pixmap.fill_rect(rect, paint, transform, None);
        }
    }

    pub fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let transform = self.transform();
        self.pixmap
            .fill_path(path, paint, FillRule::Winding, transform, None);
    }

    pub fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke) {
        let transform = self.transform();
        self.pixmap.stroke_path(path, paint, stroke, transform, None);
    }

    /// Draw the glow halo for a stroked path; the caller strokes the core.
    pub fn stroke_glow(&mut self, path: &Path, color: ColorU8, opacity: f32, stroke: &Stroke, blur: f32) {
        if blur <= 0.0 || opacity <= 0.0 {
            return;
        }
        let layer_alpha = opacity * GLOW_STRENGTH / GLOW_LAYERS as f32;
        let mut paint = Paint::default();
        paint.set_color(with_alpha(color, layer_alpha));
        for layer in (1..=GLOW_LAYERS).rev() {
            let halo = Stroke {
                width: stroke.width + blur * layer as f32 / GLOW_LAYERS as f32,
                ..stroke.clone()
            };
            self.stroke_path(path, &paint, &halo);
        }
    }

    /// Draw the glow halo around a filled shape's outline.
    pub fn fill_glow(&mut self, path: &Path, color: ColorU8, opacity: f32, blur: f32) {
        let outline = Stroke {
            width: 0.0,
            ..Stroke::default()
        };
        self.stroke_glow(path, color, opacity, &outline, blur);
    }

    /// Composite a pixmap with an explicit device-space transform.
    pub fn draw_pixmap(&mut self, pixmap: PixmapRef, transform: Transform) {
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(0, 0, pixmap, &paint, transform, None);
    }

    /// Replace the contents with `source` stretched to fill the whole surface.
    pub fn blit_scaled(&mut self, source: &Pixmap) {
        self.clear();
        let sx = self.pixmap.width() as f32 / source.width() as f32;
        let sy = self.pixmap.height() as f32 / source.height() as f32;
        self.draw_pixmap(source.as_ref(), Transform::from_scale(sx, sy));
    }

    /// Hash of the raw pixel bytes.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.pixmap)
    }

    pub fn save_png(&self, path: &FsPath) -> Result<(), SurfaceError> {
        self.pixmap.save_png(path).map_err(|e| SurfaceError::Png {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Straight RGBA bytes flattened onto an opaque background.
    pub fn to_opaque_rgba(&self, background: ColorU8) -> Vec<u8> {
        let Some(mut flat) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
            return self.pixmap.data().to_vec();
        };
        flat.fill(opaque(background));
        flat.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        flat.take()
    }
}

pub fn fingerprint(pixmap: &Pixmap) -> u64 {
    let mut hasher = DefaultHasher::new();
    pixmap.width().hash(&mut hasher);
    pixmap.height().hash(&mut hasher);
    pixmap.data().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::palette::{CYAN, WHITE};

    #[test]
    fn pixel_size_follows_dpr() {
        let surface = Surface::new(300.0, 150.5, 2.0).unwrap();
        assert_eq!(surface.pixel_width(), 600);
        assert_eq!(surface.pixel_height(), 301);
        assert_eq!(surface.width(), 300.0);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(Surface::new(f32::NAN, 10.0, 1.0).is_err());
        assert!(Surface::new(10.0, -1.0, 1.0).is_err());
        assert!(Surface::new(10.0, 10.0, 0.0).is_err());
        assert!(Surface::new(100_000.0, 10.0, 1.0).is_err());
    }

    #[test]
    fn zero_size_container_still_allocates() {
        let surface = Surface::new(0.0, 0.0, 1.0).unwrap();
        assert_eq!(surface.pixel_width(), 1);
    }

    #[test]
    fn resize_clears_contents() {
        let mut surface = Surface::new(10.0, 10.0, 1.0).unwrap();
        surface.wash(opaque(WHITE));
        let blank = Surface::new(20.0, 10.0, 1.0).unwrap().fingerprint();
        surface.resize(20.0, 10.0, 1.0).unwrap();
        assert_eq!(surface.fingerprint(), blank);
    }

    #[test]
    fn negative_rect_is_normalized() {
        let mut surface = Surface::new(10.0, 10.0, 1.0).unwrap();
        let mut paint = Paint::default();
        paint.set_color(opaque(CYAN));
        surface.fill_rect(0.0, 10.0, 10.0, -5.0, &paint);
        assert_eq!(surface.pixmap().pixel(5, 7).unwrap().alpha(), 255);
        assert_eq!(surface.pixmap().pixel(5, 2).unwrap().alpha(), 0);
    }

    #[test]
    fn blit_fills_target() {
        let mut source = Pixmap::new(40, 20).unwrap();
        source.fill(opaque(WHITE));
        let mut surface = Surface::new(13.0, 7.0, 1.0).unwrap();
        surface.blit_scaled(&source);
        assert!(surface.pixmap().pixel(0, 0).unwrap().alpha() >= 250);
        assert!(surface.pixmap().pixel(12, 6).unwrap().alpha() >= 250);
    }

    #[test]
    fn opaque_export_has_full_alpha() {
        let surface = Surface::new(4.0, 4.0, 1.0).unwrap();
        let rgba = surface.to_opaque_rgba(crate::render::palette::BACKGROUND);
        assert_eq!(rgba.len(), 4 * 4 * 4);
        assert!(rgba.chunks(4).all(|px| px[3] == 255));
    }
}
