//! Tracing subscriber installation.

use tracing_subscriber::EnvFilter;

/// Install the global JSON tracing subscriber.
///
/// Filtering comes from `RUST_LOG`, defaulting to `info`. Later calls fail
/// `try_init` and are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .try_init();
}
