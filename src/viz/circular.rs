use std::f32::consts::TAU;

use tiny_skia::{ColorU8, LineCap, Paint, Path, PathBuilder, Point, Stroke};

use super::{idle_wave, sample_at, stride, FrameInput, FrameMode, LiveView};
use crate::render::palette::{band_hue, with_alpha, BACKGROUND, CYAN, PURPLE};
use crate::render::surface::{Surface, SurfaceError};
use crate::schedule::frame::FrameClock;

/// Angle of the radial layout, owned by one renderer.
///
/// Advances every frame and is never wrapped, so the layout keeps drifting
/// for as long as the renderer lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationState {
    angle: f32,
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationState {
    pub fn new() -> Self {
        Self { angle: 0.0 }
    }

    pub fn advance(&mut self, delta: f32) {
        if delta.is_finite() {
            self.angle += delta;
        }
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

#[derive(Clone, Debug)]
pub struct CircularOptions {
    pub bar_count: usize,
    /// Inner radius as a share of the square side
    pub inner_radius: f32,
    pub min_bar_height: f32,
    pub max_bar_height: f32,
    /// Side length at which `max_bar_height` applies unscaled
    pub reference_size: f32,
    pub bar_width: f32,
    pub glow: f32,
    pub idle_glow: f32,
    pub idle_opacity: f32,
    /// Normalized magnitude above which a bar gets a tip dot
    pub dot_threshold: f32,
    pub dot_radius: f32,
    /// Radians per live frame; idle frames turn at half this rate
    pub rotation_speed: f32,
}

impl Default for CircularOptions {
    fn default() -> Self {
        Self {
            bar_count: 128,
            inner_radius: 0.15,
            min_bar_height: 5.0,
            max_bar_height: 150.0,
            reference_size: 500.0,
            bar_width: 4.0,
            glow: 20.0,
            idle_glow: 10.0,
            idle_opacity: 0.4,
            dot_threshold: 0.5,
            dot_radius: 2.0,
            rotation_speed: 0.001,
        }
    }
}

/// One radial bar of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialBar {
    pub index: usize,
    pub angle: f32,
    pub inner: Point,
    pub outer: Point,
    pub color: ColorU8,
    /// Draw the accent dot at `outer`
    pub accent: bool,
}

/// Rotating radial spectrum with center rings and a polar waveform.
pub struct CircularSpectrum {
    surface: Surface,
    options: CircularOptions,
    rotation: RotationState,
}

impl CircularSpectrum {
    pub fn new(width: f32, height: f32, dpr: f32, options: CircularOptions) -> Result<Self, SurfaceError> {
        let side = width.min(height);
        Ok(Self {
            surface: Surface::new(side, side, dpr)?,
            options,
            rotation: RotationState::new(),
        })
    }

    /// The drawing surface stays square with the container's shorter side.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        let side = width.min(height);
        self.surface.resize(side, side, dpr)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn size(&self) -> f32 {
        self.surface.width()
    }

    pub fn center(&self) -> Point {
        let half = self.size() / 2.0;
        Point::from_xy(half, half)
    }

    pub fn inner_radius(&self) -> f32 {
        self.size() * self.options.inner_radius
    }

    /// Bar geometry at the current rotation.
    ///
    /// Live bars read raw magnitudes at the shared stride; idle bars follow
    /// [`idle_wave`].
    pub fn bars(&self, input: FrameInput<'_>, seconds: f32) -> Vec<RadialBar> {
        let n = self.options.bar_count;
        let size = self.size();
        let inner_r = self.inner_radius();
        let center = self.center();
        let scale = if self.options.reference_size > 0.0 {
            size / self.options.reference_size
        } else {
            1.0
        };

        let values: Vec<Option<f32>> = match input {
            FrameInput::Live(view) => {
                let step = stride(view.magnitudes.len(), n);
                (0..n)
                    .map(|i| Some(sample_at(view.magnitudes, i, step) as f32 / 255.0))
                    .collect()
            }
            FrameInput::Idle => vec![None; n],
        };

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let length = match value {
                    Some(v) => self.options.min_bar_height + v * self.options.max_bar_height * scale,
                    None => 10.0 + idle_wave(seconds, i) * 20.0,
                };
                let angle = (i as f32 / n as f32) * TAU + self.rotation.angle();
                let (sin, cos) = angle.sin_cos();
                RadialBar {
                    index: i,
                    angle,
                    inner: Point::from_xy(center.x + cos * inner_r, center.y + sin * inner_r),
                    outer: Point::from_xy(
                        center.x + cos * (inner_r + length),
                        center.y + sin * (inner_r + length),
                    ),
                    color: band_hue(i, n),
                    accent: value.is_some_and(|v| v > self.options.dot_threshold),
                }
            })
            .collect()
    }

    /// Closed polar trace of the time-domain bytes around the center.
    pub fn waveform(&self, time_domain: &[u8]) -> Option<Path> {
        if time_domain.is_empty() {
            return None;
        }
        let center = self.center();
        let radius = self.inner_radius() * 0.6;
        let slice = TAU / time_domain.len() as f32;
        let mut pb = PathBuilder::with_capacity(time_domain.len() + 1, time_domain.len() + 1);
        for (i, &sample) in time_domain.iter().enumerate() {
            let v = sample as f32 / 128.0;
            let r = radius * (0.8 + (v - 1.0) * 0.2);
            let angle = i as f32 * slice;
            let (x, y) = (center.x + angle.cos() * r, center.y + angle.sin() * r);
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
        pb.close();
        pb.finish()
    }

    /// Advance the rotation and draw one frame.
    pub fn draw(&mut self, input: FrameInput<'_>, clock: &FrameClock) -> FrameMode {
        let seconds = clock.seconds();
        let mode = match input {
            FrameInput::Live(_) => {
                self.rotation.advance(self.options.rotation_speed);
                FrameMode::Live
            }
            FrameInput::Idle => {
                self.rotation.advance(self.options.rotation_speed * 0.5);
                FrameMode::Idle
            }
        };

        self.surface.wash(with_alpha(BACKGROUND, 0.2));

        let (opacity, glow) = match mode {
            FrameMode::Live => (1.0, self.options.glow),
            FrameMode::Idle => (self.options.idle_opacity, self.options.idle_glow),
        };
        let stroke = Stroke {
            width: self.options.bar_width,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };

        for bar in self.bars(input, seconds) {
            let mut pb = PathBuilder::new();
            pb.move_to(bar.inner.x, bar.inner.y);
            pb.line_to(bar.outer.x, bar.outer.y);
            let Some(path) = pb.finish() else {
                continue;
            };
            let mut paint = Paint::default();
            paint.set_color(with_alpha(bar.color, opacity));
            paint.anti_alias = true;
            self.surface.stroke_glow(&path, bar.color, opacity, &stroke, glow);
            self.surface.stroke_path(&path, &paint, &stroke);

            if bar.accent {
                if let Some(dot) = PathBuilder::from_circle(bar.outer.x, bar.outer.y, self.options.dot_radius) {
                    self.surface.fill_glow(&dot, bar.color, 1.0, glow * 2.0);
                    self.surface.fill_path(&dot, &paint);
                }
            }
        }

        self.draw_rings();

        if let FrameInput::Live(view) = input {
            if let Some(trace) = self.waveform(view.time_domain) {
                let line = Stroke {
                    width: 1.5,
                    ..Stroke::default()
                };
                let mut paint = Paint::default();
                paint.set_color(with_alpha(CYAN, 0.8));
                paint.anti_alias = true;
                self.surface.stroke_glow(&trace, CYAN, 0.8, &line, 10.0);
                self.surface.stroke_path(&trace, &paint, &line);
            }
        }
        mode
    }

    fn draw_rings(&mut self) {
        let center = self.center();
        let outer_r = self.inner_radius() * 0.8;
        let ring = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        for (radius, color, opacity, blur) in [(outer_r, CYAN, 0.6, 30.0), (outer_r * 0.7, PURPLE, 0.3, 15.0)] {
            let Some(circle) = PathBuilder::from_circle(center.x, center.y, radius) else {
                continue;
            };
            let mut paint = Paint::default();
            paint.set_color(with_alpha(color, opacity));
            paint.anti_alias = true;
            self.surface.stroke_glow(&circle, color, opacity, &ring, blur);
            self.surface.stroke_path(&circle, &paint, &ring);
        }
    }
}

impl LiveView for CircularSpectrum {
    fn draw(&mut self, input: FrameInput<'_>, clock: &FrameClock) -> FrameMode {
        CircularSpectrum::draw(self, input, clock)
    }

    fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        CircularSpectrum::resize(self, width, height, dpr)
    }

    fn surface(&self) -> &Surface {
        CircularSpectrum::surface(self)
    }
}
