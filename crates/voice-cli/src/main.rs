//! Voice Feature Extraction - Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use covariates::CovariateValidator;
use std::path::PathBuf;
use tracing::info;
use voice_cli::{init_logging, settings, wav};
use voice_features::FeatureExtractor;

/// Extract dysphonia features from a mono WAV recording
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mono WAV file (integer or float PCM)
    wav: PathBuf,

    /// Speaker age in years
    #[arg(long)]
    age: u32,

    /// Speaker sex: male or female
    #[arg(long)]
    sex: String,

    /// Time since recruitment into the trial
    #[arg(long)]
    test_time: f64,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pitch floor (Hz), overrides the settings
    #[arg(long)]
    floor: Option<f64>,

    /// Pitch ceiling (Hz), overrides the settings
    #[arg(long)]
    ceiling: Option<f64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print the ordered numeric model input instead of the named vector
    #[arg(long)]
    model_input: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json, args.verbose)?;

    info!("=== Voice Features v{} ===", env!("CARGO_PKG_VERSION"));

    let covariates = CovariateValidator::default()
        .validate_labelled(args.age, &args.sex, args.test_time)
        .context("Invalid covariates")?;

    let mut config = settings::load(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(floor) = args.floor {
        config.pitch.floor_hz = floor;
    }
    if let Some(ceiling) = args.ceiling {
        config.pitch.ceiling_hz = ceiling;
    }
    let extractor = FeatureExtractor::new(config)?;

    let waveform = wav::read_waveform(&args.wav)
        .with_context(|| format!("Failed to load {}", args.wav.display()))?;
    info!(
        path = %args.wav.display(),
        duration_s = waveform.duration_s(),
        sample_rate = waveform.sample_rate(),
        "Recording loaded"
    );

    let vector = extractor
        .extract(&waveform, &covariates)
        .context("Feature extraction failed")?;

    let output = match (args.model_input, args.pretty) {
        (true, true) => serde_json::to_string_pretty(&vector.to_model_input())?,
        (true, false) => serde_json::to_string(&vector.to_model_input())?,
        (false, true) => serde_json::to_string_pretty(&vector)?,
        (false, false) => serde_json::to_string(&vector)?,
    };
    println!("{output}");

    Ok(())
}
