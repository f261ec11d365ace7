//! Error types shared by the lifecycle controller and the platform backends.

use std::fmt;

use thiserror::Error;

/// Failure while bringing the application up.
///
/// Every variant short-circuits initialization. None of them are retried; the
/// caller skips the run loop and goes straight to cleanup.
#[derive(Error, Debug)]
pub enum InitError {
  /// The windowing subsystem failed to start.
  #[error("windowing subsystem failed to start: {0}")]
  Subsystem(String),

  /// The window or its surface could not be created.
  #[error("window creation failed: {0}")]
  WindowCreation(String),

  /// The graphics API entry points could not be resolved.
  #[error("couldn't load graphics entry points: {0}")]
  ExtensionLoad(String),

  /// The rendering context (device, surface, swapchain) could not be set up.
  #[error("graphics context setup failed: {0}")]
  Context(String),

  /// `initialize` was called on an application that already left the
  /// uninitialized state. Nothing was touched.
  #[error("initialization refused: application is {0}")]
  InvalidState(String),
}

/// Failure while loading `glbp.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Read(#[from] std::io::Error),

  #[error("failed to parse config file: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("invalid configuration: {0}")]
  Invalid(String),
}

/// Non-fatal error reported by the platform while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub code:        u32,
  pub description: String,
}

impl Diagnostic {
  pub fn new(code: u32, description: impl fmt::Display) -> Self {
    Self {
      code,
      description: description.to_string(),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Error {:X}: {}", self.code, self.description)
  }
}
