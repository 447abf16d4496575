//! Process-wide logging setup shared by the binaries.

/// Initialize tracing from the environment (`RUST_LOG`, `MILLERP_LOG_FORMAT`).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(&tracing::LogConfig::from_env());
}

/// Subscriber configuration (filter, output format).
pub mod tracing;

pub use self::tracing::{LogConfig, LogFormat};
