//! Layered extraction settings
//!
//! Built-in defaults, then an optional config file, then `VOICE_FEATURES__*`
//! environment variables (e.g. `VOICE_FEATURES__PITCH__FLOOR_HZ=60`).
//! Command-line pitch bounds are applied on top by the caller.

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use tracing::debug;
use voice_features::ExtractionConfig;

pub const ENV_PREFIX: &str = "VOICE_FEATURES";

/// Load the extraction config from defaults, an optional file and the environment
pub fn load(file: Option<&Path>) -> Result<ExtractionConfig, ConfigError> {
    load_with_env(file, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_env(file: Option<&Path>, env: Environment) -> Result<ExtractionConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&ExtractionConfig::default())?);
    if let Some(path) = file {
        debug!(path = %path.display(), "Loading config file");
        builder = builder.add_source(File::from(path).required(true));
    }
    builder
        .add_source(
            env.prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
