//! Voice Feature Engine
//!
//! Extracts the dysphonia feature set (jitter, shimmer, HNR/NHR, RPDE, DFA, PPE)
//! from a mono waveform and merges it with caller-supplied covariates into the
//! ordered vector consumed by the severity predictor.

mod config;
mod error;
mod extractor;
mod features;
mod fft;
mod harmonicity;
mod measure;
mod nonlinear;
mod perturbation;
mod pitch;
mod statistics;
mod waveform;

pub use config::{
    ExtractionConfig, HarmonicityConfig, NonlinearConfig, PerturbationConfig, PitchConfig,
};
pub use error::{ExtractionError, MeasureError};
pub use extractor::FeatureExtractor;
pub use features::{FeatureAssembler, FeatureKey, FeatureVector, FEATURE_DIMENSION};
pub use harmonicity::{HarmonicityCalculator, HarmonicityFeatures};
pub use measure::Measure;
pub use nonlinear::{NonlinearCalculator, NonlinearFeatures};
pub use perturbation::{PerturbationCalculator, PerturbationFeatures};
pub use pitch::{AutocorrelationTracker, PitchFrame, PitchTrack, PitchTracker};
pub use waveform::Waveform;

pub use covariates::{Covariates, CovariateValidator, Sex};
