pub mod app;
pub mod clock;
pub mod config;
mod core;
pub mod desktop;
pub mod error;
pub mod logging;
pub mod platform;
pub mod render;

// Re-export commonly used items
pub use app::{App, LifecycleState};
pub use clock::FrameClock;
pub use config::AppConfig;
pub use error::{ConfigError, Diagnostic, InitError};
pub use platform::{EventKinds, GraphicsInfo, KeyInput, Platform, PlatformEvent, ViewportRect};
pub use render::{background_color, framebuffer_viewport};
