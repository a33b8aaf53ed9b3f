//! Tracing setup for the `atlas` binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "place_atlas=info,atlas=info";

/// Install a stderr subscriber filtered by `RUST_LOG`.
///
/// Logs go to stderr so stdout stays clean JSON. `verbose` raises the
/// default to debug when `RUST_LOG` is unset.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "place_atlas=debug,atlas=debug"
    } else {
        DEFAULT_FILTER
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
