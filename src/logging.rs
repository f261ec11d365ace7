//! Log output setup.
//!
//! Lifecycle milestones go to stdout; warnings, errors and platform
//! diagnostics go to stderr.

use tracing::Level;
use tracing_subscriber::{
  EnvFilter,
  fmt::{self, writer::MakeWriterExt},
  layer::SubscriberExt,
  util::SubscriberInitExt,
};

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(level: &str) -> bool {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  let writer = std::io::stderr
    .with_max_level(Level::WARN)
    .or_else(std::io::stdout);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(
      fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(writer),
    )
    .try_init()
    .is_ok()
}
