//! Swapchain ownership and frame submission.
//!
//! A [`RenderContext`] exists for the lifetime of the window's graphics
//! binding. It is recreated lazily: resizes, present-mode changes and
//! out-of-date results only raise `recreate_swapchain`, and the next
//! [`RenderContext::draw_frame`] rebuilds the swapchain before acquiring.
//!
//! Runtime failures are returned as [`Diagnostic`]s tagged with one of the
//! codes in [`codes`]; they never abort the run loop.

use std::sync::Arc;

use tracing::{debug, info};
use vulkano::{
  Validated,
  VulkanError,
  command_buffer::{AutoCommandBufferBuilder, CommandBufferUsage, PrimaryAutoCommandBuffer},
  format::Format,
  image::{Image, ImageUsage},
  pipeline::graphics::viewport::Viewport,
  swapchain::{
    CompositeAlpha,
    PresentMode,
    Surface,
    Swapchain,
    SwapchainCreateInfo,
    SwapchainPresentInfo,
    acquire_next_image,
  },
  sync::{self, GpuFuture},
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
  core::{command_buffer_builder_ext::AutoCommandBufferBuilderExt, init::InitializedVulkan},
  error::{Diagnostic, InitError},
};

/// Diagnostic codes reported by the Vulkan backend.
pub mod codes {
  pub const SWAPCHAIN_RECREATE: u32 = 0x0001_0001;
  pub const ACQUIRE: u32 = 0x0001_0002;
  pub const RECORD: u32 = 0x0001_0003;
  pub const SUBMIT: u32 = 0x0001_0004;
  pub const PRESENT: u32 = 0x0001_0005;

  /// Failures that leave an acquired image unpresented. Only a swapchain
  /// recreation hands such an image back.
  pub fn strands_image(code: u32) -> bool {
    matches!(code, RECORD | SUBMIT)
  }
}

/// Usage every swapchain image needs: color output plus being a clear
/// destination.
pub const SWAPCHAIN_USAGE: ImageUsage = ImageUsage::COLOR_ATTACHMENT.union(ImageUsage::TRANSFER_DST);

/// Vulkan only guarantees `COLOR_ATTACHMENT` for swapchain images, so the
/// clear destination usage has to be checked against the surface.
pub fn check_swapchain_usage(supported: ImageUsage) -> Result<(), InitError> {
  if supported.contains(SWAPCHAIN_USAGE) {
    Ok(())
  } else {
    Err(InitError::Context(format!(
      "surface images support {:?}, need {:?} to clear frames",
      supported, SWAPCHAIN_USAGE
    )))
  }
}

pub struct RenderContext {
  /// The window being rendered to
  pub window:             Arc<Window>,
  pub surface:            Arc<Surface>,
  pub swapchain:          Arc<Swapchain>,
  /// Swapchain images, indexed by acquired image index
  pub images:             Vec<Arc<Image>>,
  /// Present mode applied at the next recreation
  pub present_mode:       PresentMode,
  pub recreate_swapchain: bool,
  pub previous_frame_end: Option<Box<dyn GpuFuture>>,
}

impl RenderContext {
  /// Creates a surface for `window` and a FIFO swapchain sized to it.
  pub fn new(vulkan: &InitializedVulkan, window: Arc<Window>) -> Result<Self, InitError> {
    let surface = Surface::from_window(vulkan.instance.clone(), window.clone())
      .map_err(|e| InitError::Context(e.to_string()))?;
    let window_size = window.inner_size();
    let physical_device = vulkan.device.physical_device();

    let surface_capabilities = physical_device
      .surface_capabilities(&surface, Default::default())
      .map_err(|e| InitError::Context(e.to_string()))?;
    check_swapchain_usage(surface_capabilities.supported_usage_flags)?;

    let formats = physical_device
      .surface_formats(&surface, Default::default())
      .map_err(|e| InitError::Context(e.to_string()))?;
    let (image_format, _) = formats
      .iter()
      .copied()
      .find(|(format, _)| {
        matches!(
          format,
          Format::B8G8R8A8_UNORM | Format::R8G8B8A8_UNORM | Format::A8B8G8R8_UNORM_PACK32
        )
      })
      .or_else(|| formats.first().copied())
      .ok_or_else(|| InitError::Context("surface reports no image formats".to_string()))?;

    info!("Selected format: {:?}", image_format);

    let present_mode = PresentMode::Fifo;
    let (swapchain, images) = Swapchain::new(vulkan.device.clone(), surface.clone(), SwapchainCreateInfo {
      min_image_count: surface_capabilities.min_image_count.max(2),
      image_format,
      image_extent: window_size.into(),
      image_usage: SWAPCHAIN_USAGE,
      composite_alpha: CompositeAlpha::Opaque,
      pre_transform: surface_capabilities.current_transform,
      clipped: true,
      present_mode,
      ..Default::default()
    })
    .map_err(|e| InitError::Context(e.to_string()))?;

    Ok(Self {
      window,
      surface,
      swapchain,
      images,
      present_mode,
      recreate_swapchain: false,
      previous_frame_end: Some(sync::now(vulkan.device.clone()).boxed()),
    })
  }

  /// Chooses the present mode for a swap interval: 0 presents as soon as
  /// possible, anything else waits for vertical blank.
  pub fn set_swap_interval(&mut self, vulkan: &InitializedVulkan, interval: u32) {
    let present_mode = if interval == 0 {
      let present_modes = vulkan
        .device
        .physical_device()
        .surface_present_modes(&self.surface, Default::default())
        .unwrap_or_default();

      if present_modes.contains(&PresentMode::Immediate) {
        info!("Using IMMEDIATE present mode (vsync off)");
        PresentMode::Immediate
      } else if present_modes.contains(&PresentMode::Mailbox) {
        info!("Using MAILBOX present mode (triple buffering)");
        PresentMode::Mailbox
      } else {
        info!("Using FIFO present mode (vsync on)");
        PresentMode::Fifo
      }
    } else {
      info!("Using FIFO present mode (vsync on)");
      PresentMode::Fifo
    };

    if present_mode != self.present_mode {
      self.present_mode = present_mode;
      self.recreate_swapchain = true;
    }
  }

  /// Frames are cleared whole, so a new viewport only means the surface
  /// changed size: the swapchain is rebuilt at the next frame.
  pub fn set_viewport(&mut self, viewport: Viewport) {
    debug!(offset = ?viewport.offset, extent = ?viewport.extent, "viewport updated");
    self.recreate_swapchain = true;
  }

  fn recreate(&mut self, window_size: PhysicalSize<u32>) -> Result<(), Diagnostic> {
    let (swapchain, images) = self
      .swapchain
      .recreate(SwapchainCreateInfo {
        image_extent: window_size.into(),
        present_mode: self.present_mode,
        ..self.swapchain.create_info()
      })
      .map_err(|e| Diagnostic::new(codes::SWAPCHAIN_RECREATE, e))?;

    self.swapchain = swapchain;
    self.images = images;
    self.recreate_swapchain = false;
    Ok(())
  }

  fn record_clear(
    &self,
    vulkan: &InitializedVulkan,
    image_index: u32,
    color: [f32; 4],
  ) -> Result<Arc<PrimaryAutoCommandBuffer>, Diagnostic> {
    let mut builder = AutoCommandBufferBuilder::primary(
      vulkan.command_buffer_allocator.clone(),
      vulkan.queue.queue_family_index(),
      CommandBufferUsage::OneTimeSubmit,
    )
    .map_err(|e| Diagnostic::new(codes::RECORD, e))?;

    builder
      .clear_frame(self.images[image_index as usize].clone(), color)
      .map_err(|e| Diagnostic::new(codes::RECORD, e))?;

    builder
      .build()
      .map_err(|e| Diagnostic::new(codes::RECORD, e))
  }

  /// Schedules a recreation when `diagnostic` left an acquired image behind.
  fn stranded(&mut self, diagnostic: Diagnostic) -> Diagnostic {
    if codes::strands_image(diagnostic.code) {
      self.recreate_swapchain = true;
    }
    diagnostic
  }

  /// Clears the next swapchain image to `color` and queues it for
  /// presentation. Zero-area windows are skipped.
  pub fn draw_frame(&mut self, vulkan: &InitializedVulkan, color: [f32; 4]) -> Result<(), Diagnostic> {
    let window_size = self.window.inner_size();
    if window_size.width == 0 || window_size.height == 0 {
      return Ok(());
    }

    if let Some(previous_frame_end) = self.previous_frame_end.as_mut() {
      previous_frame_end.cleanup_finished();
    }

    if self.recreate_swapchain {
      self.recreate(window_size)?;
    }

    let (image_index, suboptimal, acquire_future) =
      match acquire_next_image(self.swapchain.clone(), None).map_err(Validated::unwrap) {
        Ok(r) => r,
        Err(VulkanError::OutOfDate) => {
          self.recreate_swapchain = true;
          return Ok(());
        }
        Err(e) => return Err(Diagnostic::new(codes::ACQUIRE, e)),
      };

    if suboptimal {
      self.recreate_swapchain = true;
    }

    let command_buffer = self
      .record_clear(vulkan, image_index, color)
      .map_err(|diagnostic| self.stranded(diagnostic))?;

    let previous_frame_end = self
      .previous_frame_end
      .take()
      .unwrap_or_else(|| sync::now(vulkan.device.clone()).boxed());

    let future = previous_frame_end
      .join(acquire_future)
      .then_execute(vulkan.queue.clone(), command_buffer)
      .map_err(|e| self.stranded(Diagnostic::new(codes::SUBMIT, e)))?
      .then_swapchain_present(
        vulkan.queue.clone(),
        SwapchainPresentInfo::swapchain_image_index(self.swapchain.clone(), image_index),
      )
      .then_signal_fence_and_flush();

    match future.map_err(Validated::unwrap) {
      Ok(future) => {
        self.previous_frame_end = Some(future.boxed());
        Ok(())
      }
      Err(VulkanError::OutOfDate) => {
        self.recreate_swapchain = true;
        self.previous_frame_end = Some(sync::now(vulkan.device.clone()).boxed());
        Ok(())
      }
      Err(e) => {
        self.previous_frame_end = Some(sync::now(vulkan.device.clone()).boxed());
        Err(Diagnostic::new(codes::PRESENT, e))
      }
    }
  }
}
