//! Extraction Error Types

use thiserror::Error;

/// Hard failures that abort a whole extraction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// Empty, zero-rate or otherwise unusable waveform
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Not enough voiced frames to derive any pitch-based feature
    #[error("Insufficient voiced frames: found {found}, need at least {required}")]
    InsufficientVoicedFrames { found: usize, required: usize },

    /// Assembler source did not provide a contracted key
    #[error("Missing required feature: {0}")]
    MissingFeature(&'static str),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A calculator thread panicked before producing its output
    #[error("Feature worker panicked: {0}")]
    WorkerPanicked(&'static str),
}

/// Soft, per-feature reasons a measure could not be computed
///
/// These never abort an extraction; the affected key is reported as undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    #[error("needs {required} cycles, only {available} available")]
    TooFewCycles { required: usize, available: usize },

    #[error("no cycle window passed the period/amplitude factor checks")]
    NoAdmissibleCycles,

    #[error("needs {required} periods, only {available} available")]
    TooFewPeriods { required: usize, available: usize },

    #[error("no voiced frame produced a harmonicity estimate")]
    NoVoicedFrames,

    #[error("harmonics-to-noise ratio is at or below the -100 dB floor")]
    DegenerateHnr,

    /// Division by zero or a zero-variance input
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(&'static str),
}
