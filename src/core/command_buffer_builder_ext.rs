use std::sync::Arc;

use vulkano::{
  ValidationError,
  command_buffer::{AutoCommandBufferBuilder, ClearColorImageInfo},
  format::ClearColorValue,
  image::Image,
};

pub(crate) trait AutoCommandBufferBuilderExt {
  /// Fills every pixel of `image` with `color`.
  fn clear_frame(
    &mut self,
    image: Arc<Image>,
    color: [f32; 4],
  ) -> Result<&mut Self, Box<ValidationError>>;
}

impl<L> AutoCommandBufferBuilderExt for AutoCommandBufferBuilder<L> {
  fn clear_frame(
    &mut self,
    image: Arc<Image>,
    color: [f32; 4],
  ) -> Result<&mut Self, Box<ValidationError>> {
    // Swapchain images are UNORM; out-of-range channels saturate.
    let color = color.map(|channel| channel.clamp(0.0, 1.0));

    self.clear_color_image(ClearColorImageInfo {
      clear_value: ClearColorValue::Float(color),
      ..ClearColorImageInfo::image(image)
    })
  }
}
