//! Decoded mono PCM input

use crate::error::ExtractionError;

/// Immutable mono recording normalized to [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from floating-point samples
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Result<Self, ExtractionError> {
        if sample_rate == 0 {
            return Err(ExtractionError::InvalidAudio(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(ExtractionError::InvalidAudio("waveform is empty".to_string()));
        }
        if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
            return Err(ExtractionError::InvalidAudio(format!(
                "non-finite sample at index {idx}"
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a waveform from 32-bit float samples
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Result<Self, ExtractionError> {
        Self::new(samples.iter().map(|&s| f64::from(s)).collect(), sample_rate)
    }

    /// Create a waveform from 16-bit PCM
    pub fn from_i16(samples: &[i16], sample_rate: u32) -> Result<Self, ExtractionError> {
        Self::new(
            samples.iter().map(|&s| f64::from(s) / 32768.0).collect(),
            sample_rate,
        )
    }

    /// Create a waveform from integer PCM of the given bit depth (8..=32)
    pub fn from_pcm_ints(
        samples: &[i32],
        bits_per_sample: u16,
        sample_rate: u32,
    ) -> Result<Self, ExtractionError> {
        if !(8..=32).contains(&bits_per_sample) {
            return Err(ExtractionError::InvalidAudio(format!(
                "unsupported bit depth {bits_per_sample}"
            )));
        }
        let scale = (1u64 << (bits_per_sample - 1)) as f64;
        Self::new(
            samples.iter().map(|&s| f64::from(s) / scale).collect(),
            sample_rate,
        )
    }

    /// Sample values
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample rate (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed waveform
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |max, &s| max.max(s.abs()))
    }
}
