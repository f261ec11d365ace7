//! Per-frame rendering math and the Vulkan presentation state.
//!
//! The free functions here are backend independent: the controller uses them
//! to decide what to draw, the backend in [`swapchain`] decides how.

pub mod swapchain;

use glam::DVec3;

use crate::platform::ViewportRect;

/// Clear color for a frame at `elapsed` seconds: the same `cos(elapsed)` on
/// every color channel, so the background pulses through shades of gray.
pub fn background_color(elapsed: f64) -> [f32; 4] {
  DVec3::splat(elapsed.cos()).extend(1.0).as_vec4().to_array()
}

/// Viewport covering a framebuffer of the given size. Non-positive
/// dimensions are clamped to 1.
pub fn framebuffer_viewport(width: i32, height: i32) -> ViewportRect {
  ViewportRect {
    x:      0,
    y:      0,
    width:  width.max(1),
    height: height.max(1),
  }
}
