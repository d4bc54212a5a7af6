use std::f32::consts::PI;

/// Hann coefficients `0.5·(1 − cos(2πi/(N−1)))`.
///
/// A single-point window is the identity (1.0) rather than a division by zero.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}

/// Blackman coefficients (a = 0.16), as used by browser analyser nodes.
pub fn blackman_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    let a = 0.16f32;
    let a0 = 0.5 * (1.0 - a);
    let a1 = 0.5;
    let a2 = 0.5 * a;
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f32 / (size - 1) as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

/// Window a magnitude snapshot into a fresh float vector.
pub fn apply_hann(magnitudes: &[u8]) -> Vec<f32> {
    let mut out = Vec::with_capacity(magnitudes.len());
    SpectralWindow::default().apply(magnitudes, &mut out);
    out
}

/// Per-consumer Hann windower that keeps its coefficients between frames.
///
/// Coefficients are rebuilt only when the snapshot length changes, so the
/// per-frame cost is a single multiply per bin.
#[derive(Debug, Default)]
pub struct SpectralWindow {
    coeffs: Vec<f32>,
}

impl SpectralWindow {
    pub fn apply(&mut self, magnitudes: &[u8], out: &mut Vec<f32>) {
        if self.coeffs.len() != magnitudes.len() {
            self.coeffs = hann_window(magnitudes.len());
        }
        out.clear();
        out.extend(
            magnitudes
                .iter()
                .zip(self.coeffs.iter())
                .map(|(&m, &w)| m as f32 * w),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_is_identity() {
        assert_eq!(apply_hann(&[200]), vec![200.0]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(apply_hann(&[]).is_empty());
    }

    #[test]
    fn output_length_matches_input() {
        for n in 2..64 {
            let input = vec![255u8; n];
            assert_eq!(apply_hann(&input).len(), n);
        }
    }

    #[test]
    fn edges_are_tapered_to_zero() {
        let out = apply_hann(&[255; 9]);
        assert_eq!(out[0], 0.0);
        assert!(out[8].abs() < 1e-3);
        assert!((out[4] - 255.0).abs() < 1e-3);
    }

    #[test]
    fn window_is_reused_across_lengths() {
        let mut window = SpectralWindow::default();
        let mut out = Vec::new();
        window.apply(&[10; 16], &mut out);
        assert_eq!(out.len(), 16);
        window.apply(&[10; 4], &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn blackman_peaks_in_the_middle() {
        let w = blackman_window(5);
        assert!(w[0].abs() < 1e-6);
        assert!((w[2] - 1.0).abs() < 1e-6);
    }
}
