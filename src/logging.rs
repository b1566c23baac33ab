//! Logging setup for the command-line binary
//!
//! Diagnostics go to stderr through `tracing`, keeping stdout free for the
//! report itself. `RUST_LOG` overrides the default level.

use anyhow::{Context as _, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Default filter directive, `verbose` raises it to debug
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "salesforge=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set
pub fn init(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
