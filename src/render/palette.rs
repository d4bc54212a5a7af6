use tiny_skia::{Color, ColorU8, GradientStop, LinearGradient, Point, Shader, SpreadMode, Transform};

pub const CYAN: ColorU8 = ColorU8::from_rgba(0x00, 0xf3, 0xff, 0xff);
pub const ORANGE: ColorU8 = ColorU8::from_rgba(0xff, 0x6b, 0x00, 0xff);
pub const PURPLE: ColorU8 = ColorU8::from_rgba(0xb0, 0x26, 0xff, 0xff);
pub const PINK: ColorU8 = ColorU8::from_rgba(0xff, 0x14, 0x93, 0xff);
pub const BACKGROUND: ColorU8 = ColorU8::from_rgba(0x0a, 0x0e, 0x27, 0xff);
pub const WHITE: ColorU8 = ColorU8::from_rgba(0xff, 0xff, 0xff, 0xff);

/// Secondary text, 70% white.
pub const TEXT_SECONDARY: f32 = 0.7;

/// `color` with its alpha replaced by `alpha` (clamped to 0.0-1.0).
pub fn with_alpha(color: ColorU8, alpha: f32) -> Color {
    let mut c = Color::from_rgba8(color.red(), color.green(), color.blue(), 255);
    c.apply_opacity(if alpha.is_finite() { alpha } else { 0.0 });
    c
}

pub fn opaque(color: ColorU8) -> Color {
    with_alpha(color, 1.0)
}

/// Three-way hue banding shared by both spectrum renderers.
///
/// The first third of the bars is cyan, the middle third pink, the rest orange.
pub fn band_hue(index: usize, count: usize) -> ColorU8 {
    let count = count.max(1) as f32;
    let i = index as f32;
    if i < count / 3.0 {
        CYAN
    } else if i < 2.0 * count / 3.0 {
        PINK
    } else {
        ORANGE
    }
}

/// Bottom-to-top cyan → pink → orange gradient spanning `0..height`.
pub fn spectrum_gradient(height: f32) -> Shader<'static> {
    LinearGradient::new(
        Point::from_xy(0.0, height.max(1.0)),
        Point::from_xy(0.0, 0.0),
        vec![
            GradientStop::new(0.0, opaque(CYAN)),
            GradientStop::new(0.5, opaque(PINK)),
            GradientStop::new(1.0, opaque(ORANGE)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(opaque(CYAN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banding_splits_at_thirds() {
        assert_eq!(band_hue(0, 64), CYAN);
        assert_eq!(band_hue(21, 64), CYAN);
        assert_eq!(band_hue(22, 64), PINK);
        assert_eq!(band_hue(42, 64), PINK);
        assert_eq!(band_hue(43, 64), ORANGE);
        assert_eq!(band_hue(63, 64), ORANGE);
    }

    #[test]
    fn banding_tolerates_zero_count() {
        assert_eq!(band_hue(0, 0), CYAN);
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(with_alpha(CYAN, 2.0).alpha(), 1.0);
        assert_eq!(with_alpha(CYAN, f32::NAN).alpha(), 0.0);
    }
}
