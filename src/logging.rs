//! Process-wide log sink
//!
//! Installs a `tracing_subscriber` formatter once per process. Benchmark lines
//! are emitted with the `bench` target and carry the configured tag as a field.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Installs the global subscriber
///
/// `default_filter` applies when `RUST_LOG` is unset. Returns false when a
/// subscriber was already installed, by this crate or by the host.
pub fn init(default_filter: &str) -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    })
}
