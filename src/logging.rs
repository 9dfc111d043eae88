//! Tracing subscriber setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG`, defaulting to
/// `default_level`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout may carry the PDF or a layout dump.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
