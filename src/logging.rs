//! Logging configuration using tracing
//!
//! Download progress and skip/not-found warnings go to stderr. Filtering
//! follows `RUST_LOG` when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Without `RUST_LOG` the level is `info` (one line per downloaded file), or
/// `debug` when `verbose` is set.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=warn` - Only skips, missing files and failures
/// - `RUST_LOG=repofetch=trace` - Everything from this crate
/// - `RUST_LOG=repofetch=debug,reqwest=debug` - Include HTTP client internals
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init(verbose: bool) -> crate::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .try_init()
        .map_err(|e| crate::RepoFetchError::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init(true);
}
