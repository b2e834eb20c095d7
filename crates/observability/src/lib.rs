//! `shopcore-observability`: shared tracing/logging setup.

/// Tracing configuration (filter, JSON formatting).
pub mod tracing;

/// Initialize process-wide observability.
///
/// Safe to call more than once; subsequent calls are no-ops, so tests call
/// this freely.
pub fn init() {
    tracing::init();
}
