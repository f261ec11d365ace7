use glbp::{
  App,
  AppConfig,
  config::CONFIG_FILE,
  desktop::DesktopPlatform,
  logging::init_logging,
};

// Exits with status 0 on every path; failures are only reported in the log.
fn main() {
  let loaded = AppConfig::load(CONFIG_FILE);
  let config = loaded.as_ref().cloned().unwrap_or_default();

  init_logging(&config.logging.level);

  if let Err(e) = &loaded {
    tracing::warn!("Failed to load {}: {}, using defaults", CONFIG_FILE, e);
  }

  let mut app = App::new(DesktopPlatform::new(), config);
  if app
    .execute(std::env::args_os(), std::env::vars_os())
    .is_err()
  {
    tracing::info!("exiting after failed initialization.");
  }
}
