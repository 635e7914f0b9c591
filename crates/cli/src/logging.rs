//! Logging setup for the `filmsync` binary.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging at INFO, overridable via `RUST_LOG`.
pub fn init_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::builder().with_default_directive(tracing::Level::INFO.into()).from_env_lossy())
    .with_target(true)
    .init();
}
