use std::sync::Arc;

use tracing::info;
use vulkano::{
  Version,
  VulkanLibrary,
  command_buffer::allocator::StandardCommandBufferAllocator,
  device::{
    Device,
    DeviceCreateInfo,
    DeviceExtensions,
    Queue,
    QueueCreateInfo,
    QueueFlags,
    physical::{PhysicalDevice, PhysicalDeviceType},
  },
  instance::{Instance, InstanceCreateFlags, InstanceCreateInfo},
  swapchain::Surface,
};
use winit::event_loop::EventLoop;

use crate::{config::GraphicsConfig, error::InitError, platform::GraphicsInfo};

pub struct InitializedVulkan {
  pub instance:                 Arc<Instance>,
  pub device:                   Arc<Device>,
  pub queue:                    Arc<Queue>,
  pub command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
}

impl InitializedVulkan {
  pub fn graphics_info(&self) -> GraphicsInfo {
    let physical_device = self.device.physical_device();
    let properties = physical_device.properties();
    let api_version = self.device.api_version();

    GraphicsInfo {
      api:      "Vulkan".to_string(),
      renderer: format!("{} ({:?})", properties.device_name, properties.device_type),
      version:  format!(
        "{}.{}.{} (driver {})",
        api_version.major, api_version.minor, api_version.patch, properties.driver_version,
      ),
    }
  }
}

/// Loads the Vulkan library and creates an instance, device and graphics
/// queue able to present to windows of `event_loop`.
pub fn initialize_vulkan(
  event_loop: &EventLoop<()>,
  config: &GraphicsConfig,
) -> Result<InitializedVulkan, InitError> {
  let library = VulkanLibrary::new().map_err(|e| InitError::ExtensionLoad(e.to_string()))?;
  let required_extensions =
    Surface::required_extensions(event_loop).map_err(|e| InitError::ExtensionLoad(e.to_string()))?;

  let instance = Instance::new(library, InstanceCreateInfo {
    flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
    enabled_extensions: required_extensions,
    max_api_version: Some(Version::major_minor(config.api_major, config.api_minor)),
    ..Default::default()
  })
  .map_err(|e| InitError::Context(e.to_string()))?;

  let device_extensions = DeviceExtensions {
    khr_swapchain: true,
    ..DeviceExtensions::empty()
  };

  let (physical_device, queue_family_index) =
    select_physical_device(&instance, &device_extensions, event_loop)?;

  info!(
    "Using device: {} (type: {:?})",
    physical_device.properties().device_name,
    physical_device.properties().device_type,
  );

  let (device, mut queues) = Device::new(physical_device, DeviceCreateInfo {
    enabled_extensions: device_extensions,
    queue_create_infos: vec![QueueCreateInfo {
      queue_family_index,
      ..Default::default()
    }],
    ..Default::default()
  })
  .map_err(|e| InitError::Context(e.to_string()))?;

  let queue = queues
    .next()
    .ok_or_else(|| InitError::Context("device exposed no graphics queue".to_string()))?;

  let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
    device.clone(),
    Default::default(),
  ));

  Ok(InitializedVulkan {
    instance,
    device,
    queue,
    command_buffer_allocator,
  })
}

/// Picks the most capable device with a queue family that can both draw and
/// present.
fn select_physical_device(
  instance: &Arc<Instance>,
  device_extensions: &DeviceExtensions,
  event_loop: &EventLoop<()>,
) -> Result<(Arc<PhysicalDevice>, u32), InitError> {
  instance
    .enumerate_physical_devices()
    .map_err(|e| InitError::Context(e.to_string()))?
    .filter(|p| p.supported_extensions().contains(device_extensions))
    .filter_map(|p| {
      p.queue_family_properties()
        .iter()
        .enumerate()
        .position(|(i, q)| {
          q.queue_flags.intersects(QueueFlags::GRAPHICS)
            && p
              .presentation_support(i as u32, event_loop)
              .unwrap_or(false)
        })
        .map(|i| (p, i as u32))
    })
    .min_by_key(|(p, _)| match p.properties().device_type {
      PhysicalDeviceType::DiscreteGpu => 0,
      PhysicalDeviceType::IntegratedGpu => 1,
      PhysicalDeviceType::VirtualGpu => 2,
      PhysicalDeviceType::Cpu => 3,
      PhysicalDeviceType::Other => 4,
      _ => 5,
    })
    .ok_or_else(|| InitError::Context("no suitable physical device found".to_string()))
}
