//! Nonlinear period dynamics: PPE, RPDE and DFA
//!
//! PPE and RPDE only look at the multiset of periods, so any reordering of the
//! sequence leaves them unchanged. DFA integrates the sequence in time order and
//! is the one measure here that depends on it.

use crate::config::NonlinearConfig;
use crate::error::MeasureError;
use crate::measure::Measure;
use crate::statistics::{histogram, linear_fit, shannon_entropy, Summary};
use tracing::debug;

/// Nonlinear measures of one period sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonlinearFeatures {
    /// Recurrence period density entropy (nats)
    pub rpde: Measure,
    /// Detrended fluctuation analysis exponent
    pub dfa: Measure,
    /// Pitch period entropy (nats)
    pub ppe: Measure,
}

/// Computes PPE, RPDE and DFA from a period sequence
pub struct NonlinearCalculator {
    config: NonlinearConfig,
}

impl NonlinearCalculator {
    /// Create a new calculator
    pub fn new(config: NonlinearConfig) -> Self {
        Self { config }
    }

    /// Compute all three measures; all undefined below the minimum period count
    pub fn compute(&self, periods: &[f64]) -> NonlinearFeatures {
        if periods.len() < self.config.min_periods {
            debug!(
                periods = periods.len(),
                required = self.config.min_periods,
                "Too few periods for nonlinear measures"
            );
            let undefined = Measure::Undefined(MeasureError::TooFewPeriods {
                required: self.config.min_periods,
                available: periods.len(),
            });
            return NonlinearFeatures {
                rpde: undefined,
                dfa: undefined,
                ppe: undefined,
            };
        }

        let features = NonlinearFeatures {
            rpde: Measure::from(self.rpde(periods)),
            dfa: Measure::from(self.dfa(periods)),
            ppe: Measure::from(self.ppe(periods)),
        };
        debug!(
            periods = periods.len(),
            rpde = ?features.rpde.value(),
            dfa = ?features.dfa.value(),
            ppe = ?features.ppe.value(),
            "Nonlinear measures computed"
        );
        features
    }

    /// Entropy of the period histogram, empty bins dropped
    pub fn ppe(&self, periods: &[f64]) -> Result<f64, MeasureError> {
        let summary = Summary::compute(periods).ok_or(MeasureError::TooFewPeriods {
            required: self.config.min_periods,
            available: 0,
        })?;
        let bins = self
            .config
            .ppe_max_bins
            .min(periods.len() / self.config.ppe_periods_per_bin)
            .max(1);
        let range = if summary.max > summary.min {
            summary.max - summary.min
        } else {
            1.0
        };
        let width = range / bins as f64;
        let total = periods.len() as f64;

        let densities: Vec<f64> = histogram(periods, bins)
            .into_iter()
            .filter(|&count| count > 0)
            .map(|count| count as f64 / (total * width))
            .collect();
        shannon_entropy(&densities, self.config.entropy_epsilon)
            .ok_or(MeasureError::NumericalDegeneracy("empty period histogram"))
    }

    /// Entropy of the recurrent / non-recurrent split of all period pairs.
    ///
    /// Two periods recur when their distance is below a threshold derived from
    /// the spread of successive gaps between the sorted periods.
    pub fn rpde(&self, periods: &[f64]) -> Result<f64, MeasureError> {
        let mut sorted = periods.to_vec();
        sorted.sort_by(f64::total_cmp);

        let gaps: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
        let spread = Summary::compute(&gaps)
            .ok_or(MeasureError::TooFewPeriods {
                required: self.config.min_periods,
                available: periods.len(),
            })?
            .std_dev;
        let threshold = self.config.rpde_threshold_fraction * spread;

        // Ordered pairs (i != j) closer than the threshold
        let mut close_pairs = 0usize;
        let mut upper = 0;
        for i in 0..sorted.len() {
            upper = upper.max(i + 1);
            while upper < sorted.len() && sorted[upper] - sorted[i] < threshold {
                upper += 1;
            }
            close_pairs += upper - i - 1;
        }
        let recurrent = 2 * close_pairs;

        // Two-bin density histogram (bin width 0.5) over the flattened matrix
        let cells = (sorted.len() * sorted.len()) as f64;
        let densities = [
            (cells - recurrent as f64) / (cells * 0.5),
            recurrent as f64 / (cells * 0.5),
        ];
        shannon_entropy(&densities, self.config.entropy_epsilon)
            .ok_or(MeasureError::NumericalDegeneracy("empty recurrence matrix"))
    }

    /// Slope of log fluctuation against log scale
    pub fn dfa(&self, periods: &[f64]) -> Result<f64, MeasureError> {
        let n = periods.len();
        let summary = Summary::compute(periods).ok_or(MeasureError::TooFewPeriods {
            required: self.config.min_periods,
            available: 0,
        })?;
        if summary.max <= summary.min {
            return Err(MeasureError::NumericalDegeneracy("zero-variance periods"));
        }

        let mut level = 0.0;
        let profile: Vec<f64> = periods
            .iter()
            .map(|p| {
                level += p - summary.mean;
                level
            })
            .collect();

        let mut log_scale = Vec::new();
        let mut log_fluctuation = Vec::new();
        for scale in self.dfa_scales(n) {
            let segments = n / scale;
            if segments < 1 {
                continue;
            }
            let x: Vec<f64> = (0..scale).map(|i| i as f64).collect();
            let rms: Vec<f64> = profile
                .chunks_exact(scale)
                .filter_map(|segment| {
                    let (slope, intercept) = linear_fit(&x, segment)?;
                    let residual = segment
                        .iter()
                        .zip(&x)
                        .map(|(y, xi)| (y - (slope * xi + intercept)).powi(2))
                        .sum::<f64>()
                        / scale as f64;
                    Some(residual.sqrt())
                })
                .collect();
            let fluctuation = rms.iter().sum::<f64>() / rms.len().max(1) as f64;
            if fluctuation > 0.0 && fluctuation.is_finite() {
                log_scale.push((scale as f64).ln());
                log_fluctuation.push(fluctuation.ln());
            }
        }

        if log_scale.len() < 2 {
            return Err(MeasureError::NumericalDegeneracy(
                "fewer than two usable DFA scales",
            ));
        }
        linear_fit(&log_scale, &log_fluctuation)
            .map(|(slope, _)| slope)
            .ok_or(MeasureError::NumericalDegeneracy("DFA scales collapsed"))
    }

    /// Distinct log-spaced scales from the minimum scale up to n/4
    fn dfa_scales(&self, n: usize) -> Vec<usize> {
        let lo = (self.config.dfa_min_scale as f64).log10();
        let hi = (n as f64 / 4.0).log10();
        let count = self.config.dfa_scale_count;

        let mut scales: Vec<usize> = (0..count)
            .map(|k| {
                let exponent = lo + (hi - lo) * k as f64 / (count - 1) as f64;
                (10f64.powf(exponent) + 1e-9).floor() as usize
            })
            .filter(|&s| s >= self.config.dfa_min_scale && s <= n / 4)
            .collect();
        scales.dedup();
        scales
    }
}

impl Default for NonlinearCalculator {
    fn default() -> Self {
        Self::new(NonlinearConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Deterministic uniform values in [0, 1)
    fn lcg(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                (state >> 11) as f64 / (1u64 << 53) as f64
            })
            .collect()
    }

    fn white_periods(n: usize, seed: u64) -> Vec<f64> {
        lcg(n, seed).into_iter().map(|u| 0.007 + 0.001 * u).collect()
    }

    fn random_walk_periods(n: usize, seed: u64) -> Vec<f64> {
        let mut level = 0.007;
        lcg(n, seed)
            .into_iter()
            .map(|u| {
                level += 1e-6 * (u - 0.5);
                level
            })
            .collect()
    }

    #[test]
    fn test_boundary_at_minimum_periods() {
        let calc = NonlinearCalculator::default();

        let defined = calc.compute(&white_periods(50, 7));
        assert!(defined.rpde.is_defined());
        assert!(defined.dfa.is_defined());
        assert!(defined.ppe.is_defined());

        let undefined = calc.compute(&white_periods(49, 7));
        let expected = Measure::Undefined(MeasureError::TooFewPeriods {
            required: 50,
            available: 49,
        });
        assert_eq!(undefined.rpde, expected);
        assert_eq!(undefined.dfa, expected);
        assert_eq!(undefined.ppe, expected);
    }

    #[test]
    fn test_dfa_of_uncorrelated_periods() {
        let dfa = NonlinearCalculator::default()
            .dfa(&white_periods(2048, 11))
            .unwrap();
        assert!(dfa > 0.35 && dfa < 0.7, "white-noise DFA {dfa}");
    }

    #[test]
    fn test_dfa_of_random_walk_periods() {
        let dfa = NonlinearCalculator::default()
            .dfa(&random_walk_periods(2048, 13))
            .unwrap();
        assert!(dfa > 1.25 && dfa < 1.75, "random-walk DFA {dfa}");
    }

    #[test]
    fn test_dfa_depends_on_order() {
        let calc = NonlinearCalculator::default();
        let periods = white_periods(256, 3);
        let mut sorted = periods.clone();
        sorted.sort_by(f64::total_cmp);
        let shuffled = calc.dfa(&periods).unwrap();
        let ordered = calc.dfa(&sorted).unwrap();
        assert!((shuffled - ordered).abs() > 0.3);
    }

    #[test]
    fn test_constant_periods() {
        let calc = NonlinearCalculator::default();
        let features = calc.compute(&[0.008; 60]);
        assert!(features.ppe.value().unwrap().abs() < 1e-6);
        assert!(features.rpde.value().unwrap().abs() < 1e-6);
        assert!(matches!(
            features.dfa,
            Measure::Undefined(MeasureError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn test_ppe_of_uniform_histogram() {
        // 100 evenly spread periods fill 20 bins with 5 each
        let periods: Vec<f64> = (0..100).map(|i| 0.005 + i as f64 * 1e-5).collect();
        let ppe = NonlinearCalculator::default().ppe(&periods).unwrap();
        assert!((ppe - 20f64.ln()).abs() < 1e-6, "PPE {ppe}");
    }

    #[test]
    fn test_dfa_scales_are_distinct() {
        let scales = NonlinearCalculator::default().dfa_scales(50);
        assert_eq!(scales, vec![4, 5, 6, 7, 9, 10, 12]);
    }

    proptest! {
        #[test]
        fn prop_ppe_and_rpde_ignore_order(
            (original, shuffled) in proptest::collection::vec(0.002f64..0.012, 50..200)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let calc = NonlinearCalculator::default();
            let a = calc.compute(&original);
            let b = calc.compute(&shuffled);
            prop_assert_eq!(a.ppe, b.ppe);
            prop_assert_eq!(a.rpde, b.rpde);
        }

        #[test]
        fn prop_measures_are_finite(periods in proptest::collection::vec(0.002f64..0.012, 50..300)) {
            let features = NonlinearCalculator::default().compute(&periods);
            for measure in [features.rpde, features.ppe] {
                let value = measure.value().unwrap();
                prop_assert!(value.is_finite() && value >= 0.0);
            }
        }
    }
}
