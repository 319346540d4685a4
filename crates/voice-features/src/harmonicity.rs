//! Harmonics-to-noise ratio
//!
//! For every voiced frame the signal is cross-correlated with itself one pitch
//! period later. With normalized correlation r, the harmonic share of the frame
//! energy is r and the noise share 1 - r, so HNR = 10 log10(r / (1 - r)).

use crate::config::HarmonicityConfig;
use crate::error::MeasureError;
use crate::measure::Measure;
use crate::pitch::{parabolic_peak, PitchTrack};
use crate::waveform::Waveform;
use tracing::debug;

/// Frame HNR is clamped to this range (dB)
pub const MIN_HNR_DB: f64 = -100.0;
pub const MAX_HNR_DB: f64 = 100.0;

/// Mean HNR and the derived noise-to-harmonics ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicityFeatures {
    /// Mean harmonics-to-noise ratio over voiced frames (dB)
    pub hnr_db: Measure,
    /// Noise power relative to unit harmonic power
    pub nhr: Measure,
}

/// Computes HNR/NHR from a waveform and its pitch track
pub struct HarmonicityCalculator {
    config: HarmonicityConfig,
    floor_hz: f64,
}

impl HarmonicityCalculator {
    /// Create a new calculator for the given pitch floor
    pub fn new(config: HarmonicityConfig, floor_hz: f64) -> Self {
        Self { config, floor_hz }
    }

    /// Compute mean HNR over voiced frames and the matching NHR
    pub fn compute(&self, waveform: &Waveform, track: &PitchTrack) -> HarmonicityFeatures {
        let samples = waveform.samples();
        let sample_rate = f64::from(waveform.sample_rate());
        let segment = (self.config.periods_per_window * sample_rate / self.floor_hz).ceil() as usize;
        let silence = self.config.silence_threshold * waveform.peak();

        let frame_hnr: Vec<f64> = track
            .frames()
            .iter()
            .filter(|f| f.is_voiced())
            .filter_map(|f| {
                let centre = (f.time_s * sample_rate).round() as usize;
                let period = sample_rate / f.f0_hz;
                let correlation = period_correlation(samples, centre, period, segment, silence)?;
                Some(hnr_from_correlation(correlation))
            })
            .collect();

        if frame_hnr.is_empty() {
            debug!("No voiced frame usable for harmonicity");
            let undefined = Measure::Undefined(MeasureError::NoVoicedFrames);
            return HarmonicityFeatures {
                hnr_db: undefined,
                nhr: undefined,
            };
        }

        let hnr = frame_hnr.iter().sum::<f64>() / frame_hnr.len() as f64;
        debug!(frames = frame_hnr.len(), hnr_db = hnr, "Harmonicity computed");

        HarmonicityFeatures {
            hnr_db: Measure::Defined(hnr),
            nhr: nhr_from_hnr(hnr),
        }
    }
}

/// Convert a normalized correlation into a clamped HNR in dB
pub fn hnr_from_correlation(r: f64) -> f64 {
    let r = r.clamp(1e-12, 1.0 - 1e-12);
    (10.0 * (r / (1.0 - r)).log10()).clamp(MIN_HNR_DB, MAX_HNR_DB)
}

/// NHR = 10^(-HNR/10); undefined once HNR reaches the -100 dB floor
pub fn nhr_from_hnr(hnr_db: f64) -> Measure {
    if hnr_db <= MIN_HNR_DB {
        Measure::Undefined(MeasureError::DegenerateHnr)
    } else {
        Measure::from(Ok(10f64.powf(-hnr_db / 10.0)))
    }
}

/// Peak normalized cross-correlation at the pitch period around `centre`.
///
/// `None` when the span leaves the waveform or is below the silence level.
fn period_correlation(
    samples: &[f64],
    centre: usize,
    period: f64,
    segment: usize,
    silence: f64,
) -> Option<f64> {
    let lag = period.round() as usize;
    if lag < 2 {
        return None;
    }
    let span = segment + lag + 1;
    let start = centre.checked_sub(span / 2)?;
    if start + span > samples.len() {
        return None;
    }

    let raw = &samples[start..start + span];
    let mean = raw.iter().sum::<f64>() / span as f64;
    let x: Vec<f64> = raw.iter().map(|v| v - mean).collect();
    if x.iter().fold(0.0_f64, |m, v| m.max(v.abs())) < silence {
        return None;
    }

    let r = |tau: usize| {
        let (mut cross, mut e0, mut e1) = (0.0, 0.0, 0.0);
        for i in 0..segment {
            let (a, b) = (x[i], x[i + tau]);
            cross += a * b;
            e0 += a * a;
            e1 += b * b;
        }
        let denom = (e0 * e1).sqrt();
        if denom > f64::EPSILON {
            cross / denom
        } else {
            0.0
        }
    };

    let (y0, y1, y2) = (r(lag - 1), r(lag), r(lag + 1));
    if y1 >= y0 && y1 >= y2 {
        Some(parabolic_peak(y0, y1, y2).1.min(1.0))
    } else {
        Some(y0.max(y2))
    }
}
