//! Pitch and period tracking
//!
//! Slides a window of `periods_per_window / floor` seconds over the waveform in
//! `time_step` hops. Each frame is scored with a Hann-weighted, energy-normalized
//! autocorrelation (cross-correlation form, so a perfectly periodic frame scores 1
//! at its period regardless of window shape). The strongest local peak within the
//! [ceiling, floor] lag range, after the octave cost, gives the frame's f0.

use crate::config::PitchConfig;
use crate::fft::{hann_window, Correlator};
use crate::waveform::Waveform;
use serde::Serialize;
use tracing::debug;

/// One analysis frame of the pitch contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchFrame {
    /// Frame centre (seconds)
    pub time_s: f64,
    /// Estimated f0 (Hz), 0 when unvoiced
    pub f0_hz: f64,
    /// Normalized correlation of the chosen peak
    pub strength: f64,
}

impl PitchFrame {
    pub fn is_voiced(&self) -> bool {
        self.f0_hz > 0.0
    }
}

/// Output of a pitch tracker for one recording
///
/// `periods` and `amplitudes` are index-aligned and hold one entry per voiced
/// frame, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    frames: Vec<PitchFrame>,
    periods: Vec<f64>,
    amplitudes: Vec<f64>,
}

impl PitchTrack {
    /// Build a track, deriving periods from the voiced frames.
    ///
    /// `amplitudes` must hold one value per voiced frame.
    pub fn new(frames: Vec<PitchFrame>, amplitudes: Vec<f64>) -> Self {
        let periods: Vec<f64> = frames
            .iter()
            .filter(|f| f.is_voiced())
            .map(|f| 1.0 / f.f0_hz)
            .collect();
        debug_assert_eq!(periods.len(), amplitudes.len());
        Self {
            frames,
            periods,
            amplitudes,
        }
    }

    /// Every analysis frame, voiced or not
    pub fn frames(&self) -> &[PitchFrame] {
        &self.frames
    }

    /// Glottal-cycle durations (seconds)
    pub fn periods(&self) -> &[f64] {
        &self.periods
    }

    /// Per-cycle peak amplitudes
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn voiced_count(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Mean f0 over voiced frames
    pub fn mean_f0_hz(&self) -> Option<f64> {
        let voiced: Vec<f64> = self
            .frames
            .iter()
            .filter(|f| f.is_voiced())
            .map(|f| f.f0_hz)
            .collect();
        if voiced.is_empty() {
            None
        } else {
            Some(voiced.iter().sum::<f64>() / voiced.len() as f64)
        }
    }
}

/// Turns a waveform into a voiced/unvoiced pitch contour with derived periods
pub trait PitchTracker: Send + Sync {
    /// Track pitch over the whole waveform. Returns an empty track when the
    /// waveform is shorter than one analysis window.
    fn track(&self, waveform: &Waveform) -> PitchTrack;

    /// Lowest f0 this tracker searches for (Hz)
    fn floor_hz(&self) -> f64;
}

/// Frame geometry in samples for a given sample rate
#[derive(Debug, Clone, Copy)]
struct FrameLayout {
    window: usize,
    reference: usize,
    hop: usize,
    min_lag: usize,
    max_lag: usize,
}

impl FrameLayout {
    fn new(config: &PitchConfig, sample_rate: f64) -> Option<Self> {
        let max_lag = (sample_rate / config.floor_hz).floor() as usize;
        let min_lag = ((sample_rate / config.ceiling_hz).ceil() as usize).max(2);
        let window = (config.periods_per_window * sample_rate / config.floor_hz).ceil() as usize;
        let hop = ((config.time_step_s * sample_rate).round() as usize).max(1);
        if min_lag >= max_lag || window <= max_lag + 2 {
            return None;
        }
        Some(Self {
            window,
            reference: window - max_lag,
            hop,
            min_lag,
            max_lag,
        })
    }
}

/// Correlation peak chosen for a frame
#[derive(Debug, Clone, Copy)]
struct Candidate {
    lag: f64,
    strength: f64,
}

/// Autocorrelation pitch tracker
pub struct AutocorrelationTracker {
    config: PitchConfig,
}

impl AutocorrelationTracker {
    /// Create a new tracker
    pub fn new(config: PitchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PitchConfig {
        &self.config
    }

    /// Normalized correlation for lags `0..=max_lag + 1` of one centred frame
    fn frame_correlation(
        &self,
        frame: &[f64],
        layout: &FrameLayout,
        weights: &[f64],
        weights_spectrum: &[rustfft::num_complex::Complex<f64>],
        correlator: &Correlator,
    ) -> Vec<f64> {
        let weighted: Vec<f64> = frame[..layout.reference]
            .iter()
            .zip(weights)
            .map(|(x, w)| x * w)
            .collect();
        let squared: Vec<f64> = frame.iter().map(|x| x * x).collect();

        let frame_spectrum = correlator.spectrum(frame);
        let cross = correlator.correlate_spectra(&correlator.spectrum(&weighted), &frame_spectrum);
        let energy = correlator.correlate_spectra(weights_spectrum, &correlator.spectrum(&squared));

        let reference_energy = energy[0];
        cross
            .iter()
            .zip(energy.iter())
            .map(|(&c, &e)| {
                let denom = (reference_energy * e).sqrt();
                if denom > f64::EPSILON {
                    c / denom
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Pick the best-scoring local maximum within the lag range
    fn best_candidate(&self, r: &[f64], layout: &FrameLayout, sample_rate: f64) -> Option<Candidate> {
        let mut best: Option<(f64, Candidate)> = None;

        for lag in layout.min_lag..=layout.max_lag {
            let (y0, y1, y2) = (r[lag - 1], r[lag], r[lag + 1]);
            if !(y1 > y0 && y1 >= y2) {
                continue;
            }
            let (offset, peak) = parabolic_peak(y0, y1, y2);
            let refined = lag as f64 + offset;
            let f0 = sample_rate / refined;
            if f0 < self.config.floor_hz || f0 > self.config.ceiling_hz {
                continue;
            }
            let strength = peak.min(1.0);
            let score = strength + self.config.octave_cost * (f0 / self.config.floor_hz).log2();
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((
                    score,
                    Candidate {
                        lag: refined,
                        strength,
                    },
                ));
            }
        }

        best.map(|(_, c)| c)
    }
}

impl Default for AutocorrelationTracker {
    fn default() -> Self {
        Self::new(PitchConfig::default())
    }
}

impl PitchTracker for AutocorrelationTracker {
    fn track(&self, waveform: &Waveform) -> PitchTrack {
        let samples = waveform.samples();
        let sample_rate = f64::from(waveform.sample_rate());

        let Some(layout) = FrameLayout::new(&self.config, sample_rate) else {
            debug!(sample_rate, "Pitch range does not fit the sample rate");
            return PitchTrack::default();
        };
        if samples.len() < layout.window {
            debug!(
                samples = samples.len(),
                window = layout.window,
                "Waveform shorter than one analysis window"
            );
            return PitchTrack::default();
        }

        let global_peak = waveform.peak();
        let weights = hann_window(layout.reference);
        let correlator = Correlator::new(layout.window, layout.max_lag + 1);
        let weights_spectrum = correlator.spectrum(&weights);

        let mut frames = Vec::new();
        let mut amplitudes = Vec::new();

        let mut start = 0;
        while start + layout.window <= samples.len() {
            let raw = &samples[start..start + layout.window];
            let time_s = (start as f64 + layout.window as f64 / 2.0) / sample_rate;

            let mean = raw.iter().sum::<f64>() / raw.len() as f64;
            let frame: Vec<f64> = raw.iter().map(|x| x - mean).collect();
            let local_peak = frame.iter().fold(0.0_f64, |m, &x| m.max(x.abs()));

            let mut pitch_frame = PitchFrame {
                time_s,
                f0_hz: 0.0,
                strength: 0.0,
            };

            if global_peak > 0.0 && local_peak >= self.config.silence_threshold * global_peak {
                let r = self.frame_correlation(&frame, &layout, &weights, &weights_spectrum, &correlator);
                if let Some(candidate) = self.best_candidate(&r, &layout, sample_rate) {
                    pitch_frame.strength = candidate.strength;
                    if candidate.strength > self.config.voicing_threshold {
                        pitch_frame.f0_hz = sample_rate / candidate.lag;
                        let centre = start + layout.window / 2;
                        amplitudes.push(cycle_peak(samples, centre, candidate.lag));
                    }
                }
            }

            frames.push(pitch_frame);
            start += layout.hop;
        }

        let track = PitchTrack::new(frames, amplitudes);
        debug!(
            frames = track.frames().len(),
            voiced = track.voiced_count(),
            mean_f0_hz = track.mean_f0_hz().unwrap_or(0.0),
            "Pitch tracking complete"
        );
        track
    }

    fn floor_hz(&self) -> f64 {
        self.config.floor_hz
    }
}

/// Vertex of the parabola through three equally spaced points.
///
/// Returns the offset from the middle point (clamped to ±0.5) and the peak value.
pub(crate) fn parabolic_peak(y0: f64, y1: f64, y2: f64) -> (f64, f64) {
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() < f64::EPSILON {
        return (0.0, y1);
    }
    let offset = (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5);
    (offset, y1 - 0.25 * (y0 - y2) * offset)
}

/// Absolute peak over one period centred on `centre`, refined between samples
fn cycle_peak(samples: &[f64], centre: usize, period_samples: f64) -> f64 {
    let half = (period_samples / 2.0).round() as usize;
    let lo = centre.saturating_sub(half);
    let hi = (centre + half).min(samples.len());
    if lo >= hi {
        return 0.0;
    }

    let (idx, peak) = samples[lo..hi]
        .iter()
        .enumerate()
        .fold((0, 0.0_f64), |(bi, bv), (i, &s)| {
            if s.abs() > bv {
                (i, s.abs())
            } else {
                (bi, bv)
            }
        });
    let idx = lo + idx;
    if idx == 0 || idx + 1 >= samples.len() {
        return peak;
    }
    let (_, refined) = parabolic_peak(samples[idx - 1].abs(), peak, samples[idx + 1].abs());
    refined.max(peak)
}
