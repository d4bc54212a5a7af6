//! Full-track amplitude chart.
//!
//! The chart is drawn once per loaded buffer into a fixed 2000×600 cache and
//! the visible surface only ever receives a scaled blit of that cache. The
//! build runs on the rayon pool; results are tagged with the load generation
//! that requested them so a superseded build is dropped unapplied.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tiny_skia::{
    GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap, Point, Shader, SpreadMode,
    Stroke, Transform,
};

use crate::audio::amplitude::{extract_amplitude, DB_MAX, DB_MIN};
use crate::audio::buffer::AudioSampleBuffer;
use crate::audio::features::AmplitudePoint;
use crate::render::curve::{smooth_area, smooth_path};
use crate::render::palette::{with_alpha, BACKGROUND, CYAN, ORANGE, PURPLE, TEXT_SECONDARY, WHITE};
use crate::render::surface::{self, Surface, SurfaceError};
use crate::render::text::{Align, Baseline, TextPainter, TextStyle};
use crate::schedule::debounce::{Debouncer, DEFAULT_INTERVAL};
use crate::schedule::events::ViewEvent;

pub const CACHE_WIDTH: f32 = 2000.0;
pub const CACHE_HEIGHT: f32 = 600.0;
/// Spacing of the horizontal gridlines.
pub const DB_STEP: f32 = 20.0;

const LABEL_SIZE: f32 = 24.0;
const TITLE_SIZE: f32 = 28.0;
const PLACEHOLDER_SIZE: f32 = 16.0;
const PLACEHOLDER: &str = "Amplitude chart will appear here";

/// Plot area of the chart in some coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartLayout {
    pub width: f32,
    pub height: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl ChartLayout {
    /// Layout of the cache itself.
    pub const REFERENCE: ChartLayout = ChartLayout {
        width: CACHE_WIDTH,
        height: CACHE_HEIGHT,
        left: 100.0,
        right: 30.0,
        top: 60.0,
        bottom: 80.0,
    };

    /// The same layout after the cache is stretched by `(sx, sy)`.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            width: self.width * sx,
            height: self.height * sy,
            left: self.left * sx,
            right: self.right * sx,
            top: self.top * sy,
            bottom: self.bottom * sy,
        }
    }

    pub fn chart_width(&self) -> f32 {
        (self.width - self.left - self.right).max(0.0)
    }

    pub fn chart_height(&self) -> f32 {
        (self.height - self.top - self.bottom).max(0.0)
    }

    /// Y of the x axis.
    pub fn baseline(&self) -> f32 {
        self.top + self.chart_height()
    }

    pub fn x_for_time(&self, time: f32, duration: f32) -> f32 {
        if duration > 0.0 {
            self.left + (time / duration) * self.chart_width()
        } else {
            self.left
        }
    }

    pub fn y_for_db(&self, db: f32) -> f32 {
        self.baseline() - ((db - DB_MIN) / (DB_MAX - DB_MIN)) * self.chart_height()
    }

    pub fn time_at(&self, x: f32, duration: f32) -> f32 {
        let cw = self.chart_width();
        if cw > 0.0 {
            (x - self.left) / cw * duration
        } else {
            0.0
        }
    }

    /// Whether `(x, y)` lies inside the plot area, edges included.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left
            && x <= self.left + self.chart_width()
            && y >= self.top
            && y <= self.baseline()
    }
}

/// Vertical gridline spacing in seconds; coarser for longer tracks.
pub fn time_step(duration: f32) -> f32 {
    if duration > 60.0 {
        10.0
    } else if duration > 30.0 {
        5.0
    } else {
        2.0
    }
}

pub fn db_ticks() -> Vec<f32> {
    std::iter::successors(Some(DB_MIN), |db| Some(db + DB_STEP))
        .take_while(|db| *db <= DB_MAX)
        .collect()
}

pub fn time_ticks(duration: f32) -> Vec<f32> {
    if !(duration.is_finite() && duration > 0.0) {
        return Vec::new();
    }
    let step = time_step(duration);
    let count = (duration / step).floor() as usize;
    (0..=count).map(|i| i as f32 * step).collect()
}

/// Axis label: `"Ns"` under a minute, `"M:SS"` from a minute on.
pub fn time_label(seconds: f32) -> String {
    let (mins, secs) = split_clock(seconds);
    if mins > 0 {
        format!("{}:{:02}", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Tooltip clock, always `"M:SS"`.
pub fn format_clock(seconds: f32) -> String {
    let (mins, secs) = split_clock(seconds);
    format!("{}:{:02}", mins, secs)
}

fn split_clock(seconds: f32) -> (u64, u64) {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    (total / 60, total % 60)
}

/// Readout for the point nearest the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub screen_x: f32,
    pub screen_y: f32,
    /// Point time as `M:SS`
    pub label: String,
    /// Point level in dB, two decimals
    pub value: String,
    pub index: usize,
}

impl fmt::Display for Tooltip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time: {}  Amplitude: {} dB", self.label, self.value)
    }
}

/// Nearest point by absolute time difference; the earliest wins ties.
pub fn nearest_point(points: &[AmplitudePoint], time: f32) -> Option<(usize, &AmplitudePoint)> {
    let mut best: Option<(usize, &AmplitudePoint, f32)> = None;
    for (i, point) in points.iter().enumerate() {
        let diff = (point.time - time).abs();
        match best {
            Some((_, _, min)) if !(diff < min) => {}
            _ => best = Some((i, point, diff)),
        }
    }
    best.map(|(i, p, _)| (i, p))
}

/// The pre-rendered chart for one buffer.
pub struct AmplitudeCache {
    pixmap: Pixmap,
    points: Vec<AmplitudePoint>,
    duration: f32,
    generation: u64,
}

impl AmplitudeCache {
    /// Extract points from `buffer` and render them.
    pub fn from_buffer(
        buffer: &AudioSampleBuffer,
        painter: &TextPainter,
        dpr: f32,
        generation: u64,
    ) -> Result<Self, SurfaceError> {
        let points = extract_amplitude(buffer);
        Self::build(points, buffer.duration(), painter, dpr, generation)
    }

    pub fn build(
        points: Vec<AmplitudePoint>,
        duration: f32,
        painter: &TextPainter,
        dpr: f32,
        generation: u64,
    ) -> Result<Self, SurfaceError> {
        let layout = ChartLayout::REFERENCE;
        let mut surface = Surface::new(layout.width, layout.height, dpr)?;

        surface.wash(with_alpha(BACKGROUND, 0.5));
        draw_grid(&mut surface, &layout, duration, painter);
        draw_axes(&mut surface, &layout);
        draw_curve(&mut surface, &layout, &points, duration);
        draw_titles(&mut surface, &layout, painter);

        Ok(Self {
            pixmap: surface.into_pixmap(),
            points,
            duration,
            generation,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn points(&self) -> &[AmplitudePoint] {
        &self.points
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fingerprint(&self) -> u64 {
        surface::fingerprint(&self.pixmap)
    }

    /// Map a pointer on a `visible_width × visible_height` blit of this cache
    /// back to the nearest point.
    pub fn hit_test(&self, x: f32, y: f32, visible_width: f32, visible_height: f32) -> Option<Tooltip> {
        if self.points.is_empty() || !(visible_width > 0.0 && visible_height > 0.0) {
            return None;
        }
        // the blit stretches each axis independently, so y uses the height scale
        let layout = ChartLayout::REFERENCE
            .scaled(visible_width / CACHE_WIDTH, visible_height / CACHE_HEIGHT);
        if !layout.contains(x, y) {
            return None;
        }
        let time = layout.time_at(x, self.duration);
        let (index, point) = nearest_point(&self.points, time)?;
        Some(Tooltip {
            screen_x: x,
            screen_y: y,
            label: format_clock(point.time),
            value: format!("{:.2}", point.decibels),
            index,
        })
    }
}

fn polyline(segments: &[(f32, f32, f32, f32)]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for &(x0, y0, x1, y1) in segments {
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
    }
    pb.finish()
}

fn draw_grid(surface: &mut Surface, layout: &ChartLayout, duration: f32, painter: &TextPainter) {
    let mut paint = Paint::default();
    paint.set_color(with_alpha(WHITE, 0.05));
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    let label = TextStyle::new(LABEL_SIZE, WHITE, TEXT_SECONDARY);
    let right = layout.left + layout.chart_width();

    let db_lines: Vec<_> = db_ticks()
        .into_iter()
        .map(|db| {
            let y = layout.y_for_db(db);
            (layout.left, y, right, y)
        })
        .collect();
    let time_lines: Vec<_> = time_ticks(duration)
        .into_iter()
        .map(|t| {
            let x = layout.x_for_time(t, duration);
            (x, layout.top, x, layout.baseline())
        })
        .collect();
    for lines in [&db_lines, &time_lines] {
        if let Some(path) = polyline(lines) {
            surface.stroke_path(&path, &paint, &stroke);
        }
    }

    let db_style = label.align(Align::Right).baseline(Baseline::Middle);
    for db in db_ticks() {
        let text = format!("{} dB", db);
        painter.draw(surface, &text, layout.left - 15.0, layout.y_for_db(db), &db_style);
    }
    let time_style = label.align(Align::Center).baseline(Baseline::Top);
    for t in time_ticks(duration) {
        let x = layout.x_for_time(t, duration);
        painter.draw(surface, &time_label(t), x, layout.baseline() + 15.0, &time_style);
    }
}

fn draw_axes(surface: &mut Surface, layout: &ChartLayout) {
    let mut pb = PathBuilder::new();
    pb.move_to(layout.left, layout.top);
    pb.line_to(layout.left, layout.baseline());
    pb.line_to(layout.left + layout.chart_width(), layout.baseline());
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(with_alpha(WHITE, 0.1));
    let stroke = Stroke {
        width: 2.0,
        ..Stroke::default()
    };
    surface.stroke_path(&path, &paint, &stroke);
}

fn draw_curve(surface: &mut Surface, layout: &ChartLayout, points: &[AmplitudePoint], duration: f32) {
    let coords: Vec<Point> = points
        .iter()
        .map(|p| Point::from_xy(layout.x_for_time(p.time, duration), layout.y_for_db(p.decibels)))
        .collect();

    let mut core = Paint::default();
    core.set_color(with_alpha(CYAN, 1.0));
    core.anti_alias = true;

    if let [only] = coords.as_slice() {
        if let Some(dot) = PathBuilder::from_circle(only.x, only.y, 2.0) {
            surface.fill_path(&dot, &core);
        }
        return;
    }

    if let Some(area) = smooth_area(&coords, layout.baseline(), layout.left) {
        let fill = Paint {
            shader: area_gradient(layout),
            anti_alias: true,
            ..Paint::default()
        };
        surface.fill_path(&area, &fill);
    }

    if let Some(line) = smooth_path(&coords) {
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        surface.stroke_glow(&line, CYAN, 1.0, &stroke, 10.0);
        surface.stroke_path(&line, &core, &stroke);
    }
}

fn area_gradient(layout: &ChartLayout) -> Shader<'static> {
    LinearGradient::new(
        Point::from_xy(0.0, layout.top),
        Point::from_xy(0.0, layout.baseline()),
        vec![
            GradientStop::new(0.0, with_alpha(CYAN, 0.6)),
            GradientStop::new(0.5, with_alpha(PURPLE, 0.4)),
            GradientStop::new(1.0, with_alpha(ORANGE, 0.2)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(with_alpha(PURPLE, 0.4)))
}

fn draw_titles(surface: &mut Surface, layout: &ChartLayout, painter: &TextPainter) {
    let title = TextStyle::new(TITLE_SIZE, WHITE, TEXT_SECONDARY).align(Align::Center);
    painter.draw(
        surface,
        "Amplitude (dB)",
        30.0,
        layout.top + layout.chart_height() / 2.0,
        &title.rotated(-90.0),
    );
    painter.draw(
        surface,
        "Time (seconds)",
        layout.left + layout.chart_width() / 2.0,
        layout.height - 25.0,
        &title,
    );
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    /// No buffer; the placeholder is shown
    Empty,
    /// A cache build for the current generation is in flight
    Building,
    Ready,
}

#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Pixel density of the cache, independent of the viewport
    pub cache_dpr: f32,
    /// Pointer-move processing interval
    pub debounce: Duration,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            cache_dpr: 1.0,
            debounce: DEFAULT_INTERVAL,
        }
    }
}

type BuildMessage = (u64, Result<AmplitudeCache, SurfaceError>);

/// Visible amplitude chart: owns the cache, the viewport surface and the
/// tooltip state.
pub struct AmplitudePanel {
    painter: Arc<TextPainter>,
    options: ChartOptions,
    surface: Surface,
    state: PanelState,
    generation: u64,
    cache: Option<AmplitudeCache>,
    tx: Sender<BuildMessage>,
    rx: Receiver<BuildMessage>,
    pointer: Debouncer<(f32, f32)>,
    tooltip: Option<Tooltip>,
}

impl AmplitudePanel {
    pub fn new(
        painter: Arc<TextPainter>,
        options: ChartOptions,
        width: f32,
        height: f32,
        dpr: f32,
    ) -> Result<Self, SurfaceError> {
        let (tx, rx) = mpsc::channel();
        let mut panel = Self {
            painter,
            pointer: Debouncer::new(options.debounce),
            options,
            surface: Surface::new(width, height, dpr)?,
            state: PanelState::Empty,
            generation: 0,
            cache: None,
            tx,
            rx,
            tooltip: None,
        };
        panel.present();
        Ok(panel)
    }

    /// Start showing `buffer` (or the placeholder for `None`).
    ///
    /// Any earlier build still in flight is superseded. Returns the new
    /// load generation.
    pub fn load(&mut self, buffer: Option<Arc<AudioSampleBuffer>>) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.cache = None;
        self.pointer_leave();
        self.surface.clear();

        match buffer {
            None => {
                log::debug!("Amplitude panel cleared (generation {})", generation);
                self.state = PanelState::Empty;
            }
            Some(buffer) => {
                log::debug!(
                    "Building amplitude cache for {:.1}s of audio (generation {})",
                    buffer.duration(),
                    generation
                );
                self.state = PanelState::Building;
                let tx = self.tx.clone();
                let painter = Arc::clone(&self.painter);
                let dpr = self.options.cache_dpr;
                rayon::spawn(move || {
                    let result = AmplitudeCache::from_buffer(&buffer, &painter, dpr, generation);
                    // the panel may already be gone
                    let _ = tx.send((generation, result));
                });
            }
        }
        self.present();
        generation
    }

    /// Apply any finished builds without blocking. Returns true if the
    /// current generation's cache was applied.
    pub fn poll(&mut self) -> bool {
        let mut applied = false;
        while let Ok((generation, result)) = self.rx.try_recv() {
            applied |= self.apply(generation, result);
        }
        applied
    }

    /// Block until the current generation's build lands. Returns true when a
    /// cache is ready.
    pub fn wait(&mut self) -> bool {
        while self.state == PanelState::Building {
            match self.rx.recv() {
                Ok((generation, result)) => {
                    self.apply(generation, result);
                }
                Err(_) => break,
            }
        }
        self.state == PanelState::Ready
    }

    pub(crate) fn apply(&mut self, generation: u64, result: Result<AmplitudeCache, SurfaceError>) -> bool {
        if generation != self.generation {
            log::debug!(
                "Discarding stale amplitude cache (generation {}, current {})",
                generation,
                self.generation
            );
            return false;
        }
        match result {
            Ok(cache) => {
                log::debug!(
                    "Amplitude cache ready: {} points (generation {})",
                    cache.points().len(),
                    generation
                );
                self.cache = Some(cache);
                self.state = PanelState::Ready;
                self.present();
                true
            }
            Err(err) => {
                log::warn!("Failed to build amplitude chart: {}", err);
                self.state = PanelState::Empty;
                self.present();
                false
            }
        }
    }

    /// Resize the visible surface and re-blit the cache into it.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        self.surface.resize(width, height, dpr)?;
        self.present();
        Ok(())
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, now: Instant) {
        if self.state == PanelState::Ready {
            self.pointer.offer((x, y), now);
        }
    }

    /// Clears the tooltip and any pending hit test.
    pub fn pointer_leave(&mut self) {
        self.pointer.cancel();
        self.tooltip = None;
    }

    /// Run a debounced hit test if one is due. Returns true if the tooltip
    /// was recomputed.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        let Some((x, y)) = self.pointer.poll(now) else {
            return false;
        };
        let (w, h) = (self.surface.width(), self.surface.height());
        self.tooltip = self.cache.as_ref().and_then(|c| c.hit_test(x, y, w, h));
        true
    }

    pub fn handle_event(&mut self, event: ViewEvent, now: Instant) -> Result<(), SurfaceError> {
        match event {
            ViewEvent::Resize { width, height, dpr } => self.resize(width, height, dpr)?,
            ViewEvent::PointerMove { x, y } => self.pointer_move(x, y, now),
            ViewEvent::PointerLeave => self.pointer_leave(),
        }
        Ok(())
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn cache(&self) -> Option<&AmplitudeCache> {
        self.cache.as_ref()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    fn present(&mut self) {
        match (&self.state, &self.cache) {
            (PanelState::Ready, Some(cache)) => self.surface.blit_scaled(cache.pixmap()),
            (PanelState::Empty, _) => {
                self.surface.clear();
                let style = TextStyle::new(PLACEHOLDER_SIZE, WHITE, TEXT_SECONDARY)
                    .align(Align::Center)
                    .baseline(Baseline::Middle);
                let (x, y) = (self.surface.width() / 2.0, self.surface.height() / 2.0);
                self.painter.draw(&mut self.surface, PLACEHOLDER, x, y, &style);
            }
            // cache not ready yet
            _ => {}
        }
    }
}
