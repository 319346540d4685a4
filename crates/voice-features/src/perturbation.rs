//! Jitter and shimmer
//!
//! Cycle-to-cycle perturbation of the period and amplitude sequences. Every term
//! only uses cycles whose neighbouring pairs pass the period (and, for shimmer,
//! amplitude) factor checks; failing pairs are skipped, never treated as errors.

use crate::config::PerturbationConfig;
use crate::error::MeasureError;
use crate::measure::Measure;
use crate::statistics::mean;
use tracing::debug;

/// Jitter and shimmer measures for one recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationFeatures {
    /// Mean absolute period difference over mean period (ratio)
    pub jitter_local: Measure,
    /// Mean absolute period difference (seconds)
    pub jitter_abs: Measure,
    pub jitter_rap: Measure,
    pub jitter_ppq5: Measure,
    pub jitter_ddp: Measure,
    pub shimmer_local: Measure,
    pub shimmer_db: Measure,
    pub shimmer_apq3: Measure,
    pub shimmer_apq5: Measure,
    pub shimmer_apq11: Measure,
    pub shimmer_dda: Measure,
}

/// Computes jitter and shimmer from aligned period and amplitude sequences
pub struct PerturbationCalculator {
    config: PerturbationConfig,
}

impl PerturbationCalculator {
    /// Create a new calculator
    pub fn new(config: PerturbationConfig) -> Self {
        Self { config }
    }

    /// Compute all perturbation measures
    pub fn compute(&self, periods: &[f64], amplitudes: &[f64]) -> PerturbationFeatures {
        let n = periods.len().min(amplitudes.len());
        let periods = &periods[..n];
        let amplitudes = &amplitudes[..n];

        let period_pairs = self.period_pairs(periods);
        let amplitude_pairs: Vec<bool> = period_pairs
            .iter()
            .enumerate()
            .map(|(i, &ok)| ok && self.amplitude_pair_ok(amplitudes[i], amplitudes[i + 1]))
            .collect();

        let jitter_abs = mean_abs_difference(periods, &period_pairs);
        let relative = |result: Result<f64, MeasureError>| normalized(result, periods, "mean period");
        let shimmer = |result: Result<f64, MeasureError>| {
            normalized(result, amplitudes, "mean amplitude")
        };

        let features = PerturbationFeatures {
            jitter_local: relative(jitter_abs),
            jitter_abs: Measure::from(jitter_abs),
            jitter_rap: relative(perturbation_quotient(periods, &period_pairs, 3)),
            jitter_ppq5: relative(perturbation_quotient(periods, &period_pairs, 5)),
            jitter_ddp: relative(difference_of_differences(periods, &period_pairs)),
            shimmer_local: shimmer(mean_abs_difference(amplitudes, &amplitude_pairs)),
            shimmer_db: Measure::from(mean_abs_db_ratio(amplitudes, &amplitude_pairs)),
            shimmer_apq3: shimmer(perturbation_quotient(amplitudes, &amplitude_pairs, 3)),
            shimmer_apq5: shimmer(perturbation_quotient(amplitudes, &amplitude_pairs, 5)),
            shimmer_apq11: shimmer(perturbation_quotient(amplitudes, &amplitude_pairs, 11)),
            shimmer_dda: shimmer(difference_of_differences(amplitudes, &amplitude_pairs)),
        };

        debug!(
            cycles = n,
            admissible_period_pairs = period_pairs.iter().filter(|&&ok| ok).count(),
            admissible_amplitude_pairs = amplitude_pairs.iter().filter(|&&ok| ok).count(),
            "Perturbation measures computed"
        );
        features
    }

    /// Admissibility of each consecutive period pair
    fn period_pairs(&self, periods: &[f64]) -> Vec<bool> {
        let in_range =
            |p: f64| p >= self.config.shortest_period_s && p <= self.config.longest_period_s;
        periods
            .windows(2)
            .map(|w| {
                in_range(w[0])
                    && in_range(w[1])
                    && within_factor(w[0], w[1], self.config.max_period_factor)
            })
            .collect()
    }

    fn amplitude_pair_ok(&self, a: f64, b: f64) -> bool {
        a > 0.0 && b > 0.0 && within_factor(a, b, self.config.max_amplitude_factor)
    }
}

impl Default for PerturbationCalculator {
    fn default() -> Self {
        Self::new(PerturbationConfig::default())
    }
}

fn within_factor(a: f64, b: f64, factor: f64) -> bool {
    a > 0.0 && b > 0.0 && a.max(b) / a.min(b) <= factor
}

/// True when every pair inside the `points`-wide window centred on `centre` is admissible
fn window_ok(pairs: &[bool], centre: usize, points: usize) -> bool {
    let half = points / 2;
    pairs[centre - half..centre + half].iter().all(|&ok| ok)
}

fn require_cycles(values: &[f64], required: usize) -> Result<(), MeasureError> {
    if values.len() < required {
        Err(MeasureError::TooFewCycles {
            required,
            available: values.len(),
        })
    } else {
        Ok(())
    }
}

fn mean_of_terms(terms: Vec<f64>) -> Result<f64, MeasureError> {
    mean(&terms).ok_or(MeasureError::NoAdmissibleCycles)
}

/// Divide an absolute measure by the mean of `values`
fn normalized(
    result: Result<f64, MeasureError>,
    values: &[f64],
    what: &'static str,
) -> Measure {
    Measure::from(result.and_then(|v| match mean(values) {
        Some(m) if m > 0.0 => Ok(v / m),
        _ => Err(MeasureError::NumericalDegeneracy(what)),
    }))
}

/// mean |v[i] - v[i+1]| over admissible pairs
fn mean_abs_difference(values: &[f64], pairs: &[bool]) -> Result<f64, MeasureError> {
    require_cycles(values, 2)?;
    let terms = values
        .windows(2)
        .zip(pairs)
        .filter(|(_, ok)| **ok)
        .map(|(w, _)| (w[0] - w[1]).abs())
        .collect();
    mean_of_terms(terms)
}

/// mean |v[i] - mean(v[i-h..=i+h])| for a `points`-wide centred window
fn perturbation_quotient(values: &[f64], pairs: &[bool], points: usize) -> Result<f64, MeasureError> {
    require_cycles(values, points + 1)?;
    let half = points / 2;
    let terms = (half..values.len() - half)
        .filter(|&i| window_ok(pairs, i, points))
        .map(|i| {
            let local = values[i - half..=i + half].iter().sum::<f64>() / points as f64;
            (values[i] - local).abs()
        })
        .collect();
    mean_of_terms(terms)
}

/// mean |(v[i+1] - v[i]) - (v[i] - v[i-1])| over admissible triples
fn difference_of_differences(values: &[f64], pairs: &[bool]) -> Result<f64, MeasureError> {
    require_cycles(values, 4)?;
    let terms = (1..values.len() - 1)
        .filter(|&i| window_ok(pairs, i, 3))
        .map(|i| ((values[i + 1] - values[i]) - (values[i] - values[i - 1])).abs())
        .collect();
    mean_of_terms(terms)
}

/// mean |20 log10(a[i+1] / a[i])| over admissible pairs
fn mean_abs_db_ratio(amplitudes: &[f64], pairs: &[bool]) -> Result<f64, MeasureError> {
    require_cycles(amplitudes, 2)?;
    let terms = amplitudes
        .windows(2)
        .zip(pairs)
        .filter(|(_, ok)| **ok)
        .map(|(w, _)| (20.0 * (w[1] / w[0]).log10()).abs())
        .collect();
    mean_of_terms(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(measure: Measure, expected: f64) {
        let value = measure.value().unwrap();
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {expected}, got {value}"
        );
    }

    #[test]
    fn test_constant_cycles_have_zero_perturbation() {
        let calc = PerturbationCalculator::default();
        let features = calc.compute(&[0.008; 30], &[0.5; 30]);
        for measure in [
            features.jitter_local,
            features.jitter_abs,
            features.jitter_rap,
            features.jitter_ppq5,
            features.jitter_ddp,
            features.shimmer_local,
            features.shimmer_db,
            features.shimmer_apq3,
            features.shimmer_apq5,
            features.shimmer_apq11,
            features.shimmer_dda,
        ] {
            approx(measure, 0.0);
        }
    }

    #[test]
    fn test_alternating_periods() {
        // 10 ms / 11 ms alternating: |diff| = 1 ms everywhere
        let periods: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 0.010 } else { 0.011 })
            .collect();
        let amplitudes = vec![1.0; 20];
        let features = PerturbationCalculator::default().compute(&periods, &amplitudes);

        approx(features.jitter_abs, 0.001);
        approx(features.jitter_local, 0.001 / 0.0105);
        // |p_i - avg3| = 2/3 ms for every interior cycle
        approx(features.jitter_rap, (0.002 / 3.0) / 0.0105);
        approx(features.jitter_ddp, 0.002 / 0.0105);
    }

    #[test]
    fn test_ddp_is_three_times_rap() {
        let periods = [0.0100, 0.0102, 0.0099, 0.0101, 0.0103, 0.0098, 0.0100, 0.0101];
        let amplitudes = [0.50, 0.52, 0.49, 0.51, 0.53, 0.48, 0.50, 0.51];
        let features = PerturbationCalculator::default().compute(&periods, &amplitudes);

        let rap = features.jitter_rap.value().unwrap();
        let ddp = features.jitter_ddp.value().unwrap();
        assert!((ddp - 3.0 * rap).abs() < 1e-12);

        let apq3 = features.shimmer_apq3.value().unwrap();
        let dda = features.shimmer_dda.value().unwrap();
        assert!((dda - 3.0 * apq3).abs() < 1e-12);
    }

    #[test]
    fn test_voice_breaks_excluded() {
        // An octave jump in the middle must not contribute
        let mut periods = vec![0.010; 10];
        periods.extend(vec![0.020; 10]);
        let features = PerturbationCalculator::default().compute(&periods, &[0.5; 20]);
        approx(features.jitter_abs, 0.0);
        approx(features.jitter_rap, 0.0);
    }

    #[test]
    fn test_too_few_cycles_per_measure() {
        let features = PerturbationCalculator::default().compute(&[0.01; 5], &[0.5; 5]);
        assert!(features.jitter_local.is_defined());
        assert!(features.jitter_rap.is_defined());
        assert_eq!(
            features.jitter_ppq5,
            Measure::Undefined(MeasureError::TooFewCycles {
                required: 6,
                available: 5
            })
        );
        assert!(!features.shimmer_apq11.is_defined());
    }

    #[test]
    fn test_no_admissible_pairs() {
        let periods = [0.010, 0.020, 0.010, 0.020, 0.010];
        let features = PerturbationCalculator::default().compute(&periods, &[0.5; 5]);
        assert_eq!(
            features.jitter_local,
            Measure::Undefined(MeasureError::NoAdmissibleCycles)
        );
    }

    #[test]
    fn test_shimmer_db() {
        // 1.5x steps stay inside the default 1.6 amplitude factor
        let amplitudes = [1.0, 1.5, 1.0, 1.5, 1.0];
        let features = PerturbationCalculator::default().compute(&[0.01; 5], &amplitudes);
        approx(features.shimmer_db, 20.0 * 1.5f64.log10());
        approx(features.shimmer_local, 0.5 / 1.2);
    }
}
