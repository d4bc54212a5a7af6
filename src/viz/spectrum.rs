use tiny_skia::{ColorU8, Paint, PathBuilder, Rect};

use super::{idle_wave, sample_at, stride, FrameInput, FrameMode, LiveView};
use crate::audio::window::SpectralWindow;
use crate::render::palette::{band_hue, spectrum_gradient, with_alpha, BACKGROUND};
use crate::render::surface::{Surface, SurfaceError};
use crate::schedule::frame::FrameClock;

#[derive(Clone, Debug)]
pub struct SpectrumOptions {
    pub bar_count: usize,
    /// Gap between bars in logical pixels
    pub spacing: f32,
    /// Share of the surface height a full-scale bar reaches
    pub height_fraction: f32,
    /// Bar baseline as a share of the surface height; the ghost sits below it
    pub baseline: f32,
    pub glow: f32,
    pub idle_glow: f32,
    pub idle_opacity: f32,
    pub reflection_opacity: f32,
    /// Reflection length relative to its bar
    pub reflection_length: f32,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            bar_count: 64,
            spacing: 2.0,
            height_fraction: 0.9,
            baseline: 0.9,
            glow: 15.0,
            idle_glow: 10.0,
            idle_opacity: 0.4,
            reflection_opacity: 0.2,
            reflection_length: 0.3,
        }
    }
}

/// One bar of a frame, in logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub index: usize,
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub color: ColorU8,
}

/// Vertical frequency bars with glow and a reflected ghost.
pub struct SpectrumBars {
    surface: Surface,
    options: SpectrumOptions,
    window: SpectralWindow,
    windowed: Vec<f32>,
}

impl SpectrumBars {
    pub fn new(width: f32, height: f32, dpr: f32, options: SpectrumOptions) -> Result<Self, SurfaceError> {
        Ok(Self {
            surface: Surface::new(width, height, dpr)?,
            options,
            window: SpectralWindow::default(),
            windowed: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        self.surface.resize(width, height, dpr)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn options(&self) -> &SpectrumOptions {
        &self.options
    }

    /// Bar geometry for one frame.
    ///
    /// Live frames window the magnitudes and sample every `stride`-th bin;
    /// idle frames follow [`idle_wave`] and never see a snapshot.
    pub fn bars(&mut self, input: FrameInput<'_>, seconds: f32) -> Vec<Bar> {
        let n = self.options.bar_count;
        if n == 0 {
            return Vec::new();
        }
        let width = self.surface.width();
        let height = self.surface.height();
        let spacing = self.options.spacing;
        let bar_width = ((width - (n - 1) as f32 * spacing) / n as f32).max(0.0);

        let heights: Vec<f32> = match input {
            FrameInput::Live(view) => {
                self.window.apply(view.magnitudes, &mut self.windowed);
                let step = stride(self.windowed.len(), n);
                (0..n)
                    .map(|i| {
                        let value = sample_at(&self.windowed, i, step) / 255.0;
                        value * height * self.options.height_fraction
                    })
                    .collect()
            }
            FrameInput::Idle => (0..n).map(|i| 20.0 + idle_wave(seconds, i) * 30.0).collect(),
        };

        heights
            .into_iter()
            .enumerate()
            .map(|(i, h)| Bar {
                index: i,
                x: i as f32 * (bar_width + spacing),
                width: bar_width,
                height: if h.is_finite() { h.max(0.0) } else { 0.0 },
                color: band_hue(i, n),
            })
            .collect()
    }

    /// Draw one frame and report which branch ran.
    pub fn draw(&mut self, input: FrameInput<'_>, clock: &FrameClock) -> FrameMode {
        let mode = if input.is_live() {
            FrameMode::Live
        } else {
            FrameMode::Idle
        };
        let bars = self.bars(input, clock.seconds());

        self.surface.wash(with_alpha(BACKGROUND, 0.3));
        let baseline = self.surface.height() * self.options.baseline;
        let (opacity, glow) = match mode {
            FrameMode::Live => (1.0, self.options.glow),
            FrameMode::Idle => (self.options.idle_opacity, self.options.idle_glow),
        };

        let mut fill = Paint {
            shader: spectrum_gradient(baseline),
            anti_alias: false,
            ..Paint::default()
        };
        fill.shader.apply_opacity(opacity);
        let mut ghost = Paint {
            shader: spectrum_gradient(baseline),
            anti_alias: false,
            ..Paint::default()
        };
        ghost.shader.apply_opacity(self.options.reflection_opacity);

        for bar in &bars {
            if bar.height <= 0.0 || bar.width <= 0.0 {
                continue;
            }
            let top = baseline - bar.height;
            if let Some(rect) = Rect::from_xywh(bar.x, top, bar.width, bar.height) {
                let outline = PathBuilder::from_rect(rect);
                self.surface.fill_glow(&outline, bar.color, opacity, glow);
            }
            self.surface.fill_rect(bar.x, top, bar.width, bar.height, &fill);
            if mode == FrameMode::Live {
                let ghost_height = bar.height * self.options.reflection_length;
                self.surface.fill_rect(bar.x, baseline, bar.width, ghost_height, &ghost);
            }
        }
        mode
    }
}

impl LiveView for SpectrumBars {
    fn draw(&mut self, input: FrameInput<'_>, clock: &FrameClock) -> FrameMode {
        SpectrumBars::draw(self, input, clock)
    }

    fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        SpectrumBars::resize(self, width, height, dpr)
    }

    fn surface(&self) -> &Surface {
        SpectrumBars::surface(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::SnapshotView;
    use crate::audio::window::hann_window;

    fn renderer() -> SpectrumBars {
        SpectrumBars::new(640.0, 200.0, 1.0, SpectrumOptions::default()).unwrap()
    }

    #[test]
    fn bar_i_reads_bin_sixteen_i() {
        let mut mags = vec![0u8; 1024];
        for i in 0..64 {
            mags[16 * i] = 255;
        }
        let wave = vec![128u8; 2048];
        let mut spectrum = renderer();
        let bars = spectrum.bars(FrameInput::Live(SnapshotView::new(&mags, &wave)), 0.0);
        let hann = hann_window(1024);
        assert_eq!(bars.len(), 64);
        for bar in &bars {
            let expected = hann[16 * bar.index] * 200.0 * 0.9;
            assert!((bar.height - expected).abs() < 1e-3, "bar {}", bar.index);
        }

        // every other bin is ignored
        let inverted: Vec<u8> = mags.iter().map(|&m| 255 - m).collect();
        let bars = spectrum.bars(FrameInput::Live(SnapshotView::new(&inverted, &wave)), 0.0);
        assert!(bars.iter().all(|b| b.height == 0.0));
    }

    #[test]
    fn bars_tile_the_width() {
        let mut spectrum = renderer();
        let bars = spectrum.bars(FrameInput::Idle, 0.0);
        let last = bars[63];
        assert!((last.x + last.width - 640.0).abs() < 1e-3);
        assert_eq!(bars[0].color, crate::render::palette::CYAN);
        assert_eq!(last.color, crate::render::palette::ORANGE);
    }

    #[test]
    fn idle_heights_breathe_between_bounds() {
        let mut spectrum = renderer();
        for t in [0.0, 0.4, 3.3] {
            for bar in spectrum.bars(FrameInput::Idle, t) {
                assert!((20.0..=50.0).contains(&bar.height));
            }
        }
    }

    #[test]
    fn idle_frame_ignores_poisoned_snapshot() {
        let poison_mags = vec![255u8; 1024];
        let poison_wave = vec![0u8; 3];
        let clock = FrameClock::at_rate(42, 60);

        let mut with_poison = renderer();
        let input = FrameInput::from_source(Some(SnapshotView::new(&poison_mags, &poison_wave)), false);
        assert_eq!(with_poison.draw(input, &clock), FrameMode::Idle);

        let mut without = renderer();
        without.draw(FrameInput::from_source(None, false), &clock);
        assert_eq!(with_poison.surface().fingerprint(), without.surface().fingerprint());
    }

    #[test]
    fn short_snapshot_draws_minimal_frame() {
        let mags = [200u8; 10];
        let wave = [128u8; 10];
        let mut spectrum = renderer();
        let bars = spectrum.bars(FrameInput::Live(SnapshotView::new(&mags, &wave)), 0.0);
        // stride 0: every bar reads bin 0, whose Hann weight is zero
        assert!(bars.iter().all(|b| b.height == 0.0));
        let mode = spectrum.draw(FrameInput::Live(SnapshotView::new(&mags, &wave)), &FrameClock::at_rate(0, 60));
        assert_eq!(mode, FrameMode::Live);
    }

    #[test]
    fn resize_tracks_container() {
        let mut spectrum = renderer();
        spectrum.resize(300.0, 120.0, 2.0).unwrap();
        assert_eq!(spectrum.surface().pixel_width(), 600);
        let bars = spectrum.bars(FrameInput::Idle, 0.0);
        let last = bars[63];
        assert!((last.x + last.width - 300.0).abs() < 1e-3);
    }
}
