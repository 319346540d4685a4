//! Extraction pipeline
//!
//! waveform -> pitch track -> {perturbation, harmonicity, nonlinear} -> vector.
//! The three calculators only read the track and run on scoped threads.

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::features::{FeatureAssembler, FeatureVector};
use crate::harmonicity::HarmonicityCalculator;
use crate::nonlinear::NonlinearCalculator;
use crate::perturbation::PerturbationCalculator;
use crate::pitch::{AutocorrelationTracker, PitchTracker};
use crate::waveform::Waveform;
use covariates::Covariates;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns a waveform plus covariates into a `FeatureVector`
pub struct FeatureExtractor {
    config: ExtractionConfig,
    tracker: Box<dyn PitchTracker>,
}

impl FeatureExtractor {
    /// Create an extractor using the autocorrelation pitch tracker
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        config.validate()?;
        let tracker = Box::new(AutocorrelationTracker::new(config.pitch.clone()));
        Ok(Self { config, tracker })
    }

    /// Create an extractor with a custom pitch tracker
    pub fn with_tracker(
        config: ExtractionConfig,
        tracker: Box<dyn PitchTracker>,
    ) -> Result<Self, ExtractionError> {
        config.validate()?;
        Ok(Self { config, tracker })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run the full pipeline for one recording
    pub fn extract(
        &self,
        waveform: &Waveform,
        covariates: &Covariates,
    ) -> Result<FeatureVector, ExtractionError> {
        let started = Instant::now();
        let result = self.run(waveform, covariates);
        let elapsed = started.elapsed();

        metrics::histogram!("voice_features_extraction_seconds").record(elapsed.as_secs_f64());
        match &result {
            Ok(vector) => {
                metrics::counter!("voice_features_extractions_total", "outcome" => "ok")
                    .increment(1);
                for key in vector.undefined_keys() {
                    metrics::counter!("voice_features_undefined_total", "key" => key.as_str())
                        .increment(1);
                }
                info!(
                    duration_ms = elapsed.as_millis() as u64,
                    undefined = vector.undefined_keys().len(),
                    "Feature extraction complete"
                );
            }
            Err(e) => {
                metrics::counter!("voice_features_extractions_total", "outcome" => "error")
                    .increment(1);
                warn!(error = %e, "Feature extraction failed");
            }
        }
        result
    }

    fn run(
        &self,
        waveform: &Waveform,
        covariates: &Covariates,
    ) -> Result<FeatureVector, ExtractionError> {
        debug!(
            samples = waveform.len(),
            sample_rate = waveform.sample_rate(),
            "Tracking pitch"
        );
        let track = self.tracker.track(waveform);
        let required = self.config.pitch.min_voiced_frames;
        if track.voiced_count() < required {
            return Err(ExtractionError::InsufficientVoicedFrames {
                found: track.voiced_count(),
                required,
            });
        }
        debug!(
            frames = track.frames().len(),
            voiced = track.voiced_count(),
            mean_f0_hz = ?track.mean_f0_hz(),
            "Pitch track ready"
        );

        let perturbation = PerturbationCalculator::new(self.config.perturbation.clone());
        let harmonicity =
            HarmonicityCalculator::new(self.config.harmonicity.clone(), self.tracker.floor_hz());
        let nonlinear = NonlinearCalculator::new(self.config.nonlinear.clone());
        let track = &track;

        let (perturbation, harmonicity, nonlinear) = std::thread::scope(|scope| {
            let perturbation =
                scope.spawn(move || perturbation.compute(track.periods(), track.amplitudes()));
            let harmonicity = scope.spawn(move || harmonicity.compute(waveform, track));
            let nonlinear = scope.spawn(move || nonlinear.compute(track.periods()));

            // Join every worker before inspecting any result
            let perturbation = perturbation.join();
            let harmonicity = harmonicity.join();
            let nonlinear = nonlinear.join();
            Ok::<_, ExtractionError>((
                perturbation.map_err(|_| ExtractionError::WorkerPanicked("perturbation"))?,
                harmonicity.map_err(|_| ExtractionError::WorkerPanicked("harmonicity"))?,
                nonlinear.map_err(|_| ExtractionError::WorkerPanicked("nonlinear"))?,
            ))
        })?;

        FeatureAssembler::new()
            .perturbation(&perturbation)
            .harmonicity(&harmonicity)
            .nonlinear(&nonlinear)
            .covariates(covariates)
            .build()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        let config = ExtractionConfig::default();
        let tracker = Box::new(AutocorrelationTracker::new(config.pitch.clone()));
        Self { config, tracker }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureKey;
    use crate::measure::Measure;
    use crate::pitch::{PitchFrame, PitchTrack};
    use covariates::{CovariateValidator, Sex};

    /// Reports a fixed track regardless of input
    struct FixedTracker(PitchTrack);

    impl PitchTracker for FixedTracker {
        fn track(&self, _waveform: &Waveform) -> PitchTrack {
            self.0.clone()
        }

        fn floor_hz(&self) -> f64 {
            75.0
        }
    }

    fn covariates() -> Covariates {
        CovariateValidator::default()
            .validate(60, Sex::Female, 5.0)
            .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractionConfig::default().with_pitch_range(600.0, 75.0);
        assert!(matches!(
            FeatureExtractor::new(config),
            Err(ExtractionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unvoiced_track_is_hard_failure() {
        let extractor = FeatureExtractor::with_tracker(
            ExtractionConfig::default(),
            Box::new(FixedTracker(PitchTrack::default())),
        )
        .unwrap();
        let wave = Waveform::new(vec![0.0; 1600], 16000).unwrap();
        assert_eq!(
            extractor.extract(&wave, &covariates()),
            Err(ExtractionError::InsufficientVoicedFrames {
                found: 0,
                required: 1
            })
        );
    }

    #[test]
    fn test_short_voiced_track_gives_undefined_measures() {
        let frames: Vec<PitchFrame> = (0..10)
            .map(|i| PitchFrame {
                time_s: 0.05 + i as f64 * 0.01,
                f0_hz: 125.0,
                strength: 0.9,
            })
            .collect();
        let tracker = FixedTracker(PitchTrack::new(frames, vec![0.5; 10]));
        let extractor =
            FeatureExtractor::with_tracker(ExtractionConfig::default(), Box::new(tracker)).unwrap();
        let wave = Waveform::new(vec![0.0; 4000], 16000).unwrap();

        // Silent samples: HNR sits on its floor, so NHR is undefined
        let vector = extractor.extract(&wave, &covariates()).unwrap();
        let undefined = vector.undefined_keys();
        assert!(undefined.contains(&FeatureKey::Rpde));
        assert!(undefined.contains(&FeatureKey::Nhr));
        assert!(!undefined.contains(&FeatureKey::JitterPercent));
        assert_eq!(
            vector.get(FeatureKey::JitterPercent),
            Some(Measure::Defined(0.0))
        );
        assert_eq!(vector.get(FeatureKey::Sex), Some(Measure::Defined(0.0)));
    }
}
