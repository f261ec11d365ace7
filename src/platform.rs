//! The capability surface the lifecycle controller drives.
//!
//! A [`Platform`] bundles the windowing subsystem, the graphics entry-point
//! loader and the rendering API. All calls happen on the main thread; events
//! and diagnostics are handed back from [`Platform::poll_events`] so the
//! controller can run its callbacks synchronously inside its polling step.

use winit::{
  event::ElementState,
  keyboard::{ModifiersState, PhysicalKey},
};

use crate::{
  config::{GraphicsConfig, WindowConfig},
  error::{Diagnostic, InitError},
};

/// Viewport rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRect {
  pub x:      i32,
  pub y:      i32,
  pub width:  i32,
  pub height: i32,
}

/// Strings describing the bound rendering context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsInfo {
  /// Name of the graphics API, e.g. "Vulkan".
  pub api:      String,
  pub renderer: String,
  pub version:  String,
}

/// Which input events the platform should deliver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventKinds {
  pub key:    bool,
  pub resize: bool,
}

impl EventKinds {
  pub const ALL: Self = Self {
    key:    true,
    resize: true,
  };
}

/// A key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
  pub key:       PhysicalKey,
  pub state:     ElementState,
  pub repeat:    bool,
  pub modifiers: ModifiersState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
  Key(KeyInput),
  /// The drawable surface changed size. Values come straight from the
  /// platform and may be zero (minimized) or otherwise degenerate.
  Resize { width: i32, height: i32 },
  Error(Diagnostic),
}

pub trait Platform {
  /// Handle to the single window and its graphics surface.
  type Window;

  /// Brings the windowing subsystem up. Must be the first call.
  fn init(&mut self) -> Result<(), InitError>;

  /// Seconds since [`Platform::init`].
  fn time(&self) -> f64;

  fn create_window(&mut self, config: &WindowConfig) -> Result<Self::Window, InitError>;

  /// Resolves the graphics entry points and binds a rendering context to
  /// `window`.
  fn load_graphics(
    &mut self,
    window: &mut Self::Window,
    config: &GraphicsConfig,
  ) -> Result<GraphicsInfo, InitError>;

  fn set_swap_interval(&mut self, window: &mut Self::Window, interval: u32);

  fn subscribe(&mut self, window: &mut Self::Window, kinds: EventKinds);

  fn set_viewport(&mut self, window: &mut Self::Window, viewport: ViewportRect);

  fn clear(&mut self, window: &mut Self::Window, color: [f32; 4]);

  fn swap_buffers(&mut self, window: &mut Self::Window);

  /// Drains pending OS events and diagnostics without blocking.
  fn poll_events(&mut self, window: &mut Self::Window) -> Vec<PlatformEvent>;

  /// Whether the user asked to close `window`. Once true, stays true.
  fn should_close(&self, window: &Self::Window) -> bool;

  fn destroy_window(&mut self, window: Self::Window);

  /// Shuts the windowing subsystem down. Must be the last call.
  fn terminate(&mut self);
}
