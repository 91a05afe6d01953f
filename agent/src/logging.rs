//! Development-time tracing for debugging the agent.
//!
//! Diagnostics go to stderr via `RUST_LOG` so they never mix with the
//! answer printed on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; when unset, defaults to `warn`, or `agent=debug` with
/// `verbose`. Output: stderr, compact format.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "agent=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
