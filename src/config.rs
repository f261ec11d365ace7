//! Startup configuration.
//!
//! Every field has a default, so a missing `glbp.toml` (or a file that only
//! sets a few keys) still yields a complete configuration:
//!
//! ```toml
//! [window]
//! width = 1920
//! height = 1080
//! title = "GLBP"
//!
//! [graphics]
//! api_major = 1
//! api_minor = 2
//! swap_interval = 1
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "glbp.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub window:   WindowConfig,
  pub graphics: GraphicsConfig,
  pub logging:  LoggingConfig,
}

/// Parameters of the single application window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
  pub width:  u32,
  pub height: u32,
  pub title:  String,
}

impl Default for WindowConfig {
  fn default() -> Self {
    Self {
      width:  1920,
      height: 1080,
      title:  "GLBP".to_string(),
    }
  }
}

/// Graphics context request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
  /// Highest graphics API version the context may use.
  pub api_major:     u32,
  pub api_minor:     u32,
  /// Presentation pacing; 1 ties buffer swaps to the display refresh.
  pub swap_interval: u32,
}

impl Default for GraphicsConfig {
  fn default() -> Self {
    Self {
      api_major:     1,
      api_minor:     2,
      swap_interval: 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter directive, overridden by `RUST_LOG`.
  pub level: String,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
    }
  }
}

impl AppConfig {
  /// Reads and validates a TOML configuration file.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Self::from_toml(&content)
  }

  pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Like [`AppConfig::from_file`], but a missing file is not an error.
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
      return Ok(Self::default());
    }
    Self::from_file(path)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.window.width == 0 || self.window.height == 0 {
      return Err(ConfigError::Invalid(
        "window width and height must be greater than 0".to_string(),
      ));
    }
    if self.graphics.api_major == 0 {
      return Err(ConfigError::Invalid(
        "graphics api_major must be at least 1".to_string(),
      ));
    }
    Ok(())
  }
}
