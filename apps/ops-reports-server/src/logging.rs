use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};

/// Filter directive for a `-v` count; `None` defers to `RUST_LOG` or config.
fn verbosity_directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn build_filter(config: &LoggingConfig, verbose: u8) -> EnvFilter {
    if let Some(directive) = verbosity_directive(verbose) {
        return EnvFilter::new(directive);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs the global subscriber. Output goes to stderr.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = build_filter(config, verbose);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("failed to install tracing subscriber")
}
