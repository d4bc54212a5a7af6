use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::features::{FrequencySnapshot, SnapshotView};
use super::window::blackman_window;

#[derive(Clone, Debug)]
pub struct AnalyserConfig {
    pub fft_size: usize,
    /// Time smoothing between updates (0.0-1.0)
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            smoothing: 0.8,
            min_decibels: -90.0,
            max_decibels: -10.0,
        }
    }
}

/// Publishes byte frequency/time-domain snapshots for a moving playhead.
///
/// Stands in for a live analyser: every `update` overwrites the snapshot in
/// place, and readers borrow it through [`StreamingAnalyser::snapshot`].
pub struct StreamingAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    snapshot: FrequencySnapshot,
}

impl StreamingAnalyser {
    pub fn new(mut config: AnalyserConfig) -> Self {
        let size = config.fft_size.clamp(32, 32768).next_power_of_two();
        if size != config.fft_size {
            log::warn!("fft_size {} adjusted to {}", config.fft_size, size);
            config.fft_size = size;
        }
        config.smoothing = config.smoothing.clamp(0.0, 1.0);
        if config.max_decibels <= config.min_decibels {
            log::warn!(
                "max_decibels {} not above min_decibels {}, using defaults",
                config.max_decibels,
                config.min_decibels
            );
            let defaults = AnalyserConfig::default();
            config.min_decibels = defaults.min_decibels;
            config.max_decibels = defaults.max_decibels;
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window: blackman_window(size),
            buf: vec![Complex::new(0.0, 0.0); size],
            scratch,
            smoothed: vec![0.0; size / 2],
            snapshot: FrequencySnapshot::new(size / 2, size),
            config,
        }
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Analyse the `fft_size` samples that end at `playhead`.
    pub fn update(&mut self, samples: &[f32], playhead: usize) {
        let n = self.config.fft_size;
        let end = playhead.min(samples.len());
        let start = end.saturating_sub(n);
        let pad = n - (end - start);

        for (i, slot) in self.buf.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { sanitize(samples[start + i - pad]) };
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        for (i, byte) in self.snapshot.time_domain.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { sanitize(samples[start + i - pad]) };
            *byte = (128.0 * (1.0 + s)).floor().clamp(0.0, 255.0) as u8;
        }

        self.fft.process_with_scratch(&mut self.buf, &mut self.scratch);

        let tau = self.config.smoothing;
        let range = self.config.max_decibels - self.config.min_decibels;
        let scale = 1.0 / n as f32;
        for (k, byte) in self.snapshot.magnitudes.iter_mut().enumerate() {
            let magnitude = self.buf[k].norm() * scale;
            let prev = self.smoothed[k];
            let mut value = tau * prev + (1.0 - tau) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            self.smoothed[k] = value;

            let db = 20.0 * value.max(1e-20).log10();
            let scaled = 255.0 * (db - self.config.min_decibels) / range;
            *byte = scaled.floor().clamp(0.0, 255.0) as u8;
        }
    }

    /// Forget smoothing history, e.g. after a seek or a new track.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
        self.snapshot.magnitudes.iter_mut().for_each(|b| *b = 0);
        self.snapshot.time_domain.iter_mut().for_each(|b| *b = 128);
    }

    pub fn snapshot(&self) -> SnapshotView<'_> {
        self.snapshot.view()
    }
}

fn sanitize(s: f32) -> f32 {
    if s.is_finite() {
        s.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn snapshot_lengths_follow_fft_size() {
        let analyser = StreamingAnalyser::new(AnalyserConfig::default());
        let view = analyser.snapshot();
        assert_eq!(view.magnitudes.len(), analyser.frequency_bin_count());
        assert_eq!(view.magnitudes.len(), 512);
        assert_eq!(view.time_domain.len(), 1024);
    }

    #[test]
    fn silence_reads_as_floor_and_center() {
        let mut analyser = StreamingAnalyser::new(AnalyserConfig::default());
        analyser.update(&vec![0.0; 4096], 4096);
        let view = analyser.snapshot();
        assert!(view.magnitudes.iter().all(|&b| b == 0));
        assert!(view.time_domain.iter().all(|&b| b == 128));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let config = AnalyserConfig {
            smoothing: 0.0,
            ..AnalyserConfig::default()
        };
        let mut analyser = StreamingAnalyser::new(config);
        // bin 64 of a 1024-point FFT at 44.1kHz
        let freq = 64.0 * 44100.0 / 1024.0;
        let samples = sine(freq, 44100.0, 8192);
        analyser.update(&samples, 8192);
        let view = analyser.snapshot();
        let (peak, _) = view
            .magnitudes
            .iter()
            .enumerate()
            .max_by_key(|&(_, b)| *b)
            .unwrap();
        assert!((63..=65).contains(&peak));
        assert!(view.magnitudes[peak] > 200);
    }

    #[test]
    fn playhead_before_window_is_zero_padded() {
        let mut analyser = StreamingAnalyser::new(AnalyserConfig::default());
        analyser.update(&vec![1.0; 100], 10);
        let view = analyser.snapshot();
        assert!(view.time_domain[..1014].iter().all(|&b| b == 128));
        assert!(view.time_domain[1014..].iter().all(|&b| b == 255));
    }

    #[test]
    fn non_power_of_two_size_is_rounded_up() {
        let analyser = StreamingAnalyser::new(AnalyserConfig {
            fft_size: 1000,
            ..AnalyserConfig::default()
        });
        assert_eq!(analyser.config().fft_size, 1024);
    }
}
