//! Extraction configuration

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};

/// Pitch tracker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Lowest admissible f0 (Hz)
    pub floor_hz: f64,
    /// Highest admissible f0 (Hz)
    pub ceiling_hz: f64,
    /// Frame hop (seconds)
    pub time_step_s: f64,
    /// Analysis window length in periods of `floor_hz`
    pub periods_per_window: f64,
    /// Minimum normalized correlation for a voiced frame
    pub voicing_threshold: f64,
    /// Frames whose peak is below this fraction of the global peak are silent
    pub silence_threshold: f64,
    /// Score bonus per octave above the floor, against subharmonic picks
    pub octave_cost: f64,
    /// Fewer voiced frames than this aborts the extraction
    pub min_voiced_frames: usize,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            floor_hz: 75.0,
            ceiling_hz: 600.0,
            time_step_s: 0.01,
            periods_per_window: 3.0,
            voicing_threshold: 0.45,
            silence_threshold: 0.03,
            octave_cost: 0.01,
            min_voiced_frames: 1,
        }
    }
}

/// Jitter and shimmer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationConfig {
    /// Shortest period taking part in any measure (seconds)
    pub shortest_period_s: f64,
    /// Longest period taking part in any measure (seconds)
    pub longest_period_s: f64,
    /// Largest accepted ratio between consecutive periods
    pub max_period_factor: f64,
    /// Largest accepted ratio between consecutive amplitudes
    pub max_amplitude_factor: f64,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            shortest_period_s: 0.0001,
            longest_period_s: 0.02,
            max_period_factor: 1.3,
            max_amplitude_factor: 1.6,
        }
    }
}

/// Harmonics-to-noise settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicityConfig {
    /// Correlation window length in periods of the pitch floor
    pub periods_per_window: f64,
    /// Frames whose peak is below this fraction of the global peak are skipped
    pub silence_threshold: f64,
}

impl Default for HarmonicityConfig {
    fn default() -> Self {
        Self {
            periods_per_window: 1.0,
            silence_threshold: 0.1,
        }
    }
}

/// PPE / RPDE / DFA settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NonlinearConfig {
    /// Fewer periods than this leaves all three measures undefined
    pub min_periods: usize,
    /// Upper bound on PPE histogram bins
    pub ppe_max_bins: usize,
    /// Periods per PPE histogram bin
    pub ppe_periods_per_bin: usize,
    /// Recurrence threshold as a fraction of the std of period differences
    pub rpde_threshold_fraction: f64,
    /// Number of log-spaced DFA scales
    pub dfa_scale_count: usize,
    /// Smallest DFA scale (samples)
    pub dfa_min_scale: usize,
    /// Added to every histogram density before taking the entropy
    pub entropy_epsilon: f64,
}

impl Default for NonlinearConfig {
    fn default() -> Self {
        Self {
            min_periods: 50,
            ppe_max_bins: 20,
            ppe_periods_per_bin: 5,
            rpde_threshold_fraction: 0.1,
            dfa_scale_count: 8,
            dfa_min_scale: 4,
            entropy_epsilon: 1e-10,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub pitch: PitchConfig,
    pub perturbation: PerturbationConfig,
    pub harmonicity: HarmonicityConfig,
    pub nonlinear: NonlinearConfig,
}

impl ExtractionConfig {
    /// Override the pitch search range
    pub fn with_pitch_range(mut self, floor_hz: f64, ceiling_hz: f64) -> Self {
        self.pitch.floor_hz = floor_hz;
        self.pitch.ceiling_hz = ceiling_hz;
        self
    }

    /// Reject settings the algorithms cannot work with
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let invalid = |msg: String| Err(ExtractionError::InvalidConfig(msg));

        let p = &self.pitch;
        if !(p.floor_hz > 0.0 && p.floor_hz.is_finite()) {
            return invalid(format!("pitch floor must be positive, got {}", p.floor_hz));
        }
        if !(p.ceiling_hz > p.floor_hz && p.ceiling_hz.is_finite()) {
            return invalid(format!(
                "pitch ceiling {} must exceed floor {}",
                p.ceiling_hz, p.floor_hz
            ));
        }
        if !(p.time_step_s > 0.0) {
            return invalid(format!("time step must be positive, got {}", p.time_step_s));
        }
        if !(p.periods_per_window >= 2.0) {
            return invalid(format!(
                "pitch window must cover at least 2 periods, got {}",
                p.periods_per_window
            ));
        }
        if !(0.0..1.0).contains(&p.voicing_threshold) {
            return invalid(format!("voicing threshold {} not in [0, 1)", p.voicing_threshold));
        }
        if !(0.0..1.0).contains(&p.silence_threshold) {
            return invalid(format!("silence threshold {} not in [0, 1)", p.silence_threshold));
        }

        let q = &self.perturbation;
        if !(q.shortest_period_s < q.longest_period_s) {
            return invalid("shortest period must be below longest period".to_string());
        }
        if !(q.max_period_factor >= 1.0 && q.max_amplitude_factor >= 1.0) {
            return invalid("period and amplitude factors must be at least 1".to_string());
        }

        if !(self.harmonicity.periods_per_window > 0.0) {
            return invalid("harmonicity window must be positive".to_string());
        }

        let n = &self.nonlinear;
        if n.ppe_max_bins == 0 || n.ppe_periods_per_bin == 0 {
            return invalid("PPE bin settings must be non-zero".to_string());
        }
        if n.dfa_scale_count < 2 || n.dfa_min_scale < 3 {
            return invalid("DFA needs at least 2 scales starting at 3 samples or more".to_string());
        }
        if n.min_periods < 4 * n.dfa_min_scale {
            return invalid(format!(
                "nonlinear minimum of {} periods cannot hold a DFA scale of {}",
                n.min_periods, n.dfa_min_scale
            ));
        }
        Ok(())
    }
}
