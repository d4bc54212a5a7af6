use serde::Serialize;

/// One RMS window of the loaded track, in the order it was extracted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AmplitudePoint {
    /// Window start in seconds
    pub time: f32,
    /// RMS magnitude (0.0-1.0)
    pub amplitude: f32,
    /// RMS in dB, clamped to DB_MIN..=DB_MAX
    pub decibels: f32,
}

/// Frequency and time-domain bytes as published by the analysis source.
///
/// Owned by the source and overwritten in place on every update. Renderers
/// only ever see a [`SnapshotView`] borrowed for the current frame.
#[derive(Clone, Debug, Default)]
pub struct FrequencySnapshot {
    /// Frequency magnitudes (0-255), `fft_size / 2` bins
    pub magnitudes: Vec<u8>,
    /// Time-domain samples (0-255, centered at 128), `fft_size` samples
    pub time_domain: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(bins: usize, samples: usize) -> Self {
        Self {
            magnitudes: vec![0; bins],
            time_domain: vec![128; samples],
        }
    }

    pub fn view(&self) -> SnapshotView<'_> {
        SnapshotView {
            magnitudes: &self.magnitudes,
            time_domain: &self.time_domain,
        }
    }
}

/// Read-only view of a snapshot, valid for a single frame.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotView<'a> {
    pub magnitudes: &'a [u8],
    pub time_domain: &'a [u8],
}

impl<'a> SnapshotView<'a> {
    pub fn new(magnitudes: &'a [u8], time_domain: &'a [u8]) -> Self {
        Self {
            magnitudes,
            time_domain,
        }
    }
}
