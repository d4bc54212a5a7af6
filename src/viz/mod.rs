pub mod amplitude;
pub mod circular;
pub mod spectrum;

use crate::audio::features::SnapshotView;
use crate::render::surface::{Surface, SurfaceError};
use crate::schedule::frame::FrameClock;

/// What a live renderer may read on one frame.
///
/// Idle frames carry no snapshot at all, so the synthetic animation cannot
/// pick up stale or garbage analyser output.
#[derive(Clone, Copy, Debug)]
pub enum FrameInput<'a> {
    Idle,
    Live(SnapshotView<'a>),
}

impl<'a> FrameInput<'a> {
    /// A missing source or a paused transport both render idle.
    pub fn from_source(snapshot: Option<SnapshotView<'a>>, playing: bool) -> Self {
        match snapshot {
            Some(view) if playing => FrameInput::Live(view),
            _ => FrameInput::Idle,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, FrameInput::Live(_))
    }
}

/// Which branch a renderer took on its last frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    Live,
    Idle,
}

/// A per-frame renderer that owns its drawing surface.
pub trait LiveView {
    fn draw(&mut self, input: FrameInput<'_>, clock: &FrameClock) -> FrameMode;
    fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError>;
    fn surface(&self) -> &Surface;
}

/// Bin spacing when `len` values are sampled down to `count` bars.
///
/// Floor division: the trailing `len % count` bins are never read.
pub fn stride(len: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        len / count
    }
}

/// Value read for bar `index`; zero past the end of a short snapshot.
pub fn sample_at<T: Copy + Default>(values: &[T], index: usize, stride: usize) -> T {
    values.get(index * stride).copied().unwrap_or_default()
}

/// The idle "breathing" phase for bar `index` at `seconds`, in 0.0-1.0.
pub fn idle_wave(seconds: f32, index: usize) -> f32 {
    (seconds * 2.0 + index as f32 * 0.1).sin() * 0.5 + 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_floors_and_guards_zero() {
        assert_eq!(stride(1024, 64), 16);
        assert_eq!(stride(1000, 64), 15);
        assert_eq!(stride(10, 64), 0);
        assert_eq!(stride(10, 0), 0);
    }

    #[test]
    fn short_snapshot_reads_zero() {
        assert_eq!(sample_at(&[7u8, 9], 3, 1), 0);
        assert_eq!(sample_at(&[7u8, 9], 5, 0), 7);
    }

    #[test]
    fn idle_wave_stays_in_unit_range() {
        for i in 0..128 {
            let w = idle_wave(i as f32 * 0.37, i);
            assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn paused_source_is_idle() {
        let mags = [255u8; 4];
        let wave = [0u8; 8];
        let view = SnapshotView::new(&mags, &wave);
        assert!(FrameInput::from_source(Some(view), true).is_live());
        assert!(!FrameInput::from_source(Some(view), false).is_live());
        assert!(!FrameInput::from_source(None, true).is_live());
    }
}
