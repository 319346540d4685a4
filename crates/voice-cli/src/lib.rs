//! Voice Feature CLI
//!
//! Decodes a mono WAV file, layers the extraction settings and prints the
//! dysphonia feature vector as JSON.

pub mod settings;
pub mod wav;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initialize logging on stderr; `RUST_LOG` wins over the verbosity flag
pub fn init_logging(json: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}
