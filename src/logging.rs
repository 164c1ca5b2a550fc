// src/logging.rs
// =============================================================================
// Sets up tracing output.
//
// Diagnostics go to stderr so that `--json` output on stdout stays parseable.
// The level comes from RUST_LOG when set, e.g.
//   RUST_LOG=debug avr-core-mirror standard ./out/
// =============================================================================

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // try_init fails only if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
