//! Feature Vector Assembly
//!
//! The key set and its order are the contract consumed by the downstream
//! predictor. Reordering or renaming a key is a breaking change.

use crate::error::ExtractionError;
use crate::harmonicity::HarmonicityFeatures;
use crate::measure::Measure;
use crate::nonlinear::NonlinearFeatures;
use crate::perturbation::PerturbationFeatures;
use covariates::Covariates;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// Number of keys in the vector (16 acoustic + 3 covariates)
pub const FEATURE_DIMENSION: usize = 19;

/// Named slot of the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    JitterPercent,
    JitterAbs,
    JitterRap,
    JitterPpq5,
    JitterDdp,
    Shimmer,
    ShimmerDb,
    ShimmerApq3,
    ShimmerApq5,
    ShimmerApq11,
    ShimmerDda,
    Nhr,
    Hnr,
    Rpde,
    Dfa,
    Ppe,
    Age,
    Sex,
    TestTime,
}

impl FeatureKey {
    /// Every key in contract order
    pub const ALL: [FeatureKey; FEATURE_DIMENSION] = [
        FeatureKey::JitterPercent,
        FeatureKey::JitterAbs,
        FeatureKey::JitterRap,
        FeatureKey::JitterPpq5,
        FeatureKey::JitterDdp,
        FeatureKey::Shimmer,
        FeatureKey::ShimmerDb,
        FeatureKey::ShimmerApq3,
        FeatureKey::ShimmerApq5,
        FeatureKey::ShimmerApq11,
        FeatureKey::ShimmerDda,
        FeatureKey::Nhr,
        FeatureKey::Hnr,
        FeatureKey::Rpde,
        FeatureKey::Dfa,
        FeatureKey::Ppe,
        FeatureKey::Age,
        FeatureKey::Sex,
        FeatureKey::TestTime,
    ];

    /// Column name expected by the predictor
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::JitterPercent => "Jitter(%)",
            FeatureKey::JitterAbs => "Jitter(Abs)",
            FeatureKey::JitterRap => "Jitter:RAP",
            FeatureKey::JitterPpq5 => "Jitter:PPQ5",
            FeatureKey::JitterDdp => "Jitter:DDP",
            FeatureKey::Shimmer => "Shimmer",
            FeatureKey::ShimmerDb => "Shimmer(dB)",
            FeatureKey::ShimmerApq3 => "Shimmer:APQ3",
            FeatureKey::ShimmerApq5 => "Shimmer:APQ5",
            FeatureKey::ShimmerApq11 => "Shimmer:APQ11",
            FeatureKey::ShimmerDda => "Shimmer:DDA",
            FeatureKey::Nhr => "NHR",
            FeatureKey::Hnr => "HNR",
            FeatureKey::Rpde => "RPDE",
            FeatureKey::Dfa => "DFA",
            FeatureKey::Ppe => "PPE",
            FeatureKey::Age => "age",
            FeatureKey::Sex => "sex",
            FeatureKey::TestTime => "test_time",
        }
    }

    /// Whether the engine computes this key (as opposed to the caller)
    pub fn is_acoustic(&self) -> bool {
        !matches!(self, FeatureKey::Age | FeatureKey::Sex | FeatureKey::TestTime)
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete, ordered feature vector for one recording
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(FeatureKey, Measure)>,
}

impl FeatureVector {
    /// Look up one key
    pub fn get(&self, key: FeatureKey) -> Option<Measure> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, m)| *m)
    }

    /// Entries in contract order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, Measure)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of entries (always `FEATURE_DIMENSION`)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose measure could not be computed
    pub fn undefined_keys(&self) -> Vec<FeatureKey> {
        self.entries
            .iter()
            .filter(|(_, m)| !m.is_defined())
            .map(|(k, _)| *k)
            .collect()
    }

    /// Ordered numeric input for the predictor.
    ///
    /// Undefined and non-finite values become 0.0.
    pub fn to_model_input(&self) -> Vec<f64> {
        self.entries
            .iter()
            .map(|(_, m)| m.value().filter(|v| v.is_finite()).unwrap_or(0.0))
            .collect()
    }
}

/// Serializes as a JSON object in contract order, undefined values as `null`
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, measure) in &self.entries {
            map.serialize_entry(key.as_str(), measure)?;
        }
        map.end()
    }
}

/// Merges calculator outputs and covariates into a `FeatureVector`
#[derive(Debug, Default)]
pub struct FeatureAssembler {
    staged: HashMap<FeatureKey, Measure>,
}

impl FeatureAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a single value
    pub fn insert(&mut self, key: FeatureKey, measure: Measure) -> &mut Self {
        self.staged.insert(key, measure);
        self
    }

    /// Stage the jitter and shimmer measures
    pub fn perturbation(&mut self, features: &PerturbationFeatures) -> &mut Self {
        self.insert(FeatureKey::JitterPercent, features.jitter_local.map(|v| v * 100.0))
            .insert(FeatureKey::JitterAbs, features.jitter_abs)
            .insert(FeatureKey::JitterRap, features.jitter_rap)
            .insert(FeatureKey::JitterPpq5, features.jitter_ppq5)
            .insert(FeatureKey::JitterDdp, features.jitter_ddp)
            .insert(FeatureKey::Shimmer, features.shimmer_local)
            .insert(FeatureKey::ShimmerDb, features.shimmer_db)
            .insert(FeatureKey::ShimmerApq3, features.shimmer_apq3)
            .insert(FeatureKey::ShimmerApq5, features.shimmer_apq5)
            .insert(FeatureKey::ShimmerApq11, features.shimmer_apq11)
            .insert(FeatureKey::ShimmerDda, features.shimmer_dda)
    }

    /// Stage HNR and NHR
    pub fn harmonicity(&mut self, features: &HarmonicityFeatures) -> &mut Self {
        self.insert(FeatureKey::Nhr, features.nhr)
            .insert(FeatureKey::Hnr, features.hnr_db)
    }

    /// Stage RPDE, DFA and PPE
    pub fn nonlinear(&mut self, features: &NonlinearFeatures) -> &mut Self {
        self.insert(FeatureKey::Rpde, features.rpde)
            .insert(FeatureKey::Dfa, features.dfa)
            .insert(FeatureKey::Ppe, features.ppe)
    }

    /// Stage the caller-supplied covariates
    pub fn covariates(&mut self, covariates: &Covariates) -> &mut Self {
        self.insert(FeatureKey::Age, Measure::Defined(f64::from(covariates.age())))
            .insert(
                FeatureKey::Sex,
                Measure::Defined(f64::from(covariates.sex().encoded())),
            )
            .insert(FeatureKey::TestTime, Measure::Defined(covariates.test_time()))
    }

    /// Produce the ordered vector; fails if any key was never staged
    pub fn build(&self) -> Result<FeatureVector, ExtractionError> {
        let entries = FeatureKey::ALL
            .iter()
            .map(|key| {
                self.staged
                    .get(key)
                    .map(|m| (*key, *m))
                    .ok_or(ExtractionError::MissingFeature(key.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            undefined = entries.iter().filter(|(_, m)| !m.is_defined()).count(),
            "Feature vector assembled"
        );
        Ok(FeatureVector { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeasureError;
    use covariates::{CovariateValidator, Sex};

    fn perturbation() -> PerturbationFeatures {
        PerturbationFeatures {
            jitter_local: Measure::Defined(0.005),
            jitter_abs: Measure::Defined(4e-5),
            jitter_rap: Measure::Defined(0.002),
            jitter_ppq5: Measure::Defined(0.003),
            jitter_ddp: Measure::Defined(0.006),
            shimmer_local: Measure::Defined(0.03),
            shimmer_db: Measure::Defined(0.28),
            shimmer_apq3: Measure::Defined(0.015),
            shimmer_apq5: Measure::Defined(0.018),
            shimmer_apq11: Measure::Undefined(MeasureError::TooFewCycles {
                required: 12,
                available: 10,
            }),
            shimmer_dda: Measure::Defined(0.045),
        }
    }

    fn full_assembler() -> FeatureAssembler {
        let covariates = CovariateValidator::default()
            .validate(65, Sex::Male, 12.5)
            .unwrap();
        let mut assembler = FeatureAssembler::new();
        assembler
            .perturbation(&perturbation())
            .harmonicity(&HarmonicityFeatures {
                hnr_db: Measure::Defined(21.0),
                nhr: Measure::Defined(0.008),
            })
            .nonlinear(&NonlinearFeatures {
                rpde: Measure::Defined(0.5),
                dfa: Measure::Defined(0.7),
                ppe: Measure::Defined(0.2),
            })
            .covariates(&covariates);
        assembler
    }

    #[test]
    fn test_key_order_is_contract_order() {
        let vector = full_assembler().build().unwrap();
        let names: Vec<&str> = vector.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Jitter(%)", "Jitter(Abs)", "Jitter:RAP", "Jitter:PPQ5", "Jitter:DDP",
                "Shimmer", "Shimmer(dB)", "Shimmer:APQ3", "Shimmer:APQ5", "Shimmer:APQ11",
                "Shimmer:DDA", "NHR", "HNR", "RPDE", "DFA", "PPE", "age", "sex", "test_time",
            ]
        );
    }

    #[test]
    fn test_jitter_percent_is_scaled() {
        let vector = full_assembler().build().unwrap();
        let value = vector.get(FeatureKey::JitterPercent).unwrap().value().unwrap();
        assert!((value - 0.5).abs() < 1e-12);
        assert_eq!(vector.get(FeatureKey::Sex), Some(Measure::Defined(1.0)));
    }

    #[test]
    fn test_missing_key_fails() {
        let mut assembler = FeatureAssembler::new();
        assembler.perturbation(&perturbation());
        assert_eq!(
            assembler.build(),
            Err(ExtractionError::MissingFeature("NHR"))
        );
    }

    #[test]
    fn test_model_input_zeroes_undefined() {
        let vector = full_assembler().build().unwrap();
        let input = vector.to_model_input();
        assert_eq!(input.len(), FEATURE_DIMENSION);
        assert_eq!(input[9], 0.0);
        assert_eq!(vector.undefined_keys(), vec![FeatureKey::ShimmerApq11]);
        assert_eq!(input[16], 65.0);
    }

    #[test]
    fn test_json_is_ordered_with_nulls() {
        let vector = full_assembler().build().unwrap();
        let json = serde_json::to_string(&vector).unwrap();
        assert!(json.starts_with("{\"Jitter(%)\":0.5,"));
        assert!(json.contains("\"Shimmer:APQ11\":null"));
        assert!(json.ends_with("\"test_time\":12.5}"));
        let hnr = json.find("\"HNR\"").unwrap();
        let nhr = json.find("\"NHR\"").unwrap();
        assert!(nhr < hnr);
    }
}
