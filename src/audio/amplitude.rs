use rayon::prelude::*;

use super::buffer::AudioSampleBuffer;
use super::features::AmplitudePoint;

/// Floor of the amplitude scale; silence lands here.
pub const DB_MIN: f32 = -90.0;
/// Ceiling of the amplitude scale.
pub const DB_MAX: f32 = 3.0;
/// Length of one RMS window in seconds.
pub const WINDOW_SECONDS: f32 = 0.5;

const EPSILON: f32 = 1e-10;

/// Convert channel 0 into one decibel point per ~0.5s window.
///
/// The final window may be shorter than the others. Empty buffers (or a
/// buffer without channels) produce an empty sequence.
pub fn extract_amplitude(buffer: &AudioSampleBuffer) -> Vec<AmplitudePoint> {
    let Some(samples) = buffer.channel(0) else {
        return Vec::new();
    };
    let sample_rate = buffer.sample_rate();
    if samples.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let window = samples_per_window(sample_rate);

    samples
        .par_chunks(window)
        .enumerate()
        .map(|(i, chunk)| {
            let rms = rms(chunk);
            AmplitudePoint {
                time: (i * window) as f32 / sample_rate as f32,
                amplitude: rms.clamp(0.0, 1.0),
                decibels: to_decibels(rms),
            }
        })
        .collect()
}

pub fn samples_per_window(sample_rate: u32) -> usize {
    ((sample_rate as f32 * WINDOW_SECONDS).floor() as usize).max(1)
}

/// Root mean square; non-finite samples count as silence.
pub fn rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum: f64 = chunk
        .iter()
        .map(|&s| if s.is_finite() { (s as f64) * (s as f64) } else { 0.0 })
        .sum();
    (sum / chunk.len() as f64).sqrt() as f32
}

/// `20·log10(rms)` clamped to `DB_MIN..=DB_MAX`.
pub fn to_decibels(rms: f32) -> f32 {
    let rms = if rms.is_finite() { rms } else { 0.0 };
    (20.0 * rms.max(EPSILON).log10()).clamp(DB_MIN, DB_MAX)
}
