//! FFT-based correlation

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Hann weights of the given length with strictly positive end points
pub fn hann_window(len: usize) -> Vec<f64> {
    let denom = (len + 1) as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * (i + 1) as f64 / denom).cos())
        .collect()
}

/// Linear cross-correlation at non-negative lags, computed in the frequency domain
///
/// `correlate(a, b)[lag] = Σ a[i] · b[i + lag]`, valid for every lag up to `max_lag`
/// as long as `a.len() + max_lag` and `b.len()` fit in the planned size.
pub struct Correlator {
    size: usize,
    max_lag: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl Correlator {
    /// Plan transforms for operands up to `max_len` samples and lags up to `max_lag`
    pub fn new(max_len: usize, max_lag: usize) -> Self {
        let size = (max_len + max_lag + 1).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            size,
            max_lag,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        }
    }

    /// Transform length
    pub fn size(&self) -> usize {
        self.size
    }

    /// Zero-padded forward transform of `signal`
    pub fn spectrum(&self, signal: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .take(self.size)
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.forward.process(&mut buffer);
        buffer
    }

    /// Correlation at lags `0..=max_lag` from two precomputed spectra
    pub fn correlate_spectra(&self, a: &[Complex<f64>], b: &[Complex<f64>]) -> Vec<f64> {
        let mut product: Vec<Complex<f64>> = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| x.conj() * y)
            .collect();
        self.inverse.process(&mut product);

        let scale = 1.0 / self.size as f64;
        product
            .iter()
            .take(self.max_lag + 1)
            .map(|c| c.re * scale)
            .collect()
    }

    /// Correlation of two time-domain signals at lags `0..=max_lag`
    pub fn correlate(&self, a: &[f64], b: &[f64]) -> Vec<f64> {
        self.correlate_spectra(&self.spectrum(a), &self.spectrum(b))
    }
}
