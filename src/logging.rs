//! Logging setup.
//!
//! Installs a `tracing` subscriber writing to stderr. `RUST_LOG` takes
//! precedence; otherwise the level from `[logging].level` applies.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. Safe to call more than once; only the
/// first call installs anything.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
