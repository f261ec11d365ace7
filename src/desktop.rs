//! Desktop [`Platform`] built on winit and vulkano.
//!
//! winit normally owns the main loop through `run_app`. Here the event loop
//! is pumped instead (`pump_app_events` with a zero timeout), which lets the
//! lifecycle controller keep its own tick/render/poll loop while winit still
//! delivers events through [`ApplicationHandler`] callbacks.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use tracing::{debug, warn};
use vulkano::pipeline::graphics::viewport::Viewport;
use winit::{
  application::ApplicationHandler,
  dpi::LogicalSize,
  error::OsError,
  event::WindowEvent,
  event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
  keyboard::ModifiersState,
  platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
  window::{Window, WindowAttributes, WindowId},
};

use crate::{
  config::{GraphicsConfig, WindowConfig},
  core::init::{InitializedVulkan, initialize_vulkan},
  error::InitError,
  platform::{EventKinds, GraphicsInfo, KeyInput, Platform, PlatformEvent, ViewportRect},
  render::swapchain::RenderContext,
};

/// How many times window creation pumps the event loop waiting for `resumed`.
const RESUME_ATTEMPTS: usize = 100;
const RESUME_POLL: Duration = Duration::from_millis(10);

#[derive(Default)]
pub struct DesktopPlatform {
  event_loop: Option<EventLoop<()>>,
  started:    Option<Instant>,
  vulkan:     Option<InitializedVulkan>,
  modifiers:  ModifiersState,
  /// Diagnostics raised outside of polling, delivered by the next poll.
  pending:    Vec<PlatformEvent>,
}

pub struct DesktopWindow {
  window:          Arc<Window>,
  rcx:             Option<RenderContext>,
  subscription:    EventKinds,
  clear_color:     [f32; 4],
  close_requested: bool,
}

impl DesktopPlatform {
  pub fn new() -> Self {
    Self::default()
  }
}

/// Creates the window once the event loop reports it is resumed.
struct WindowCreator {
  attributes: Option<WindowAttributes>,
  created:    Option<Result<Window, OsError>>,
}

impl ApplicationHandler for WindowCreator {
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    if let Some(attributes) = self.attributes.take() {
      self.created = Some(event_loop.create_window(attributes));
    }
  }

  fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, _event: WindowEvent) {}
}

/// Translates winit window events into [`PlatformEvent`]s for one pump.
struct EventCollector<'a> {
  window_id:       WindowId,
  subscription:    EventKinds,
  modifiers:       &'a mut ModifiersState,
  events:          Vec<PlatformEvent>,
  close_requested: bool,
}

impl ApplicationHandler for EventCollector<'_> {
  fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

  fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
    self.collect(window_id, event);
  }
}

impl EventCollector<'_> {
  fn collect(&mut self, window_id: WindowId, event: WindowEvent) {
    if window_id != self.window_id {
      return;
    }

    match event {
      WindowEvent::CloseRequested => {
        self.close_requested = true;
      }
      WindowEvent::ModifiersChanged(modifiers) => {
        *self.modifiers = modifiers.state();
      }
      WindowEvent::Resized(size) if self.subscription.resize => {
        self.events.push(PlatformEvent::Resize {
          width:  i32::try_from(size.width).unwrap_or(i32::MAX),
          height: i32::try_from(size.height).unwrap_or(i32::MAX),
        });
      }
      WindowEvent::KeyboardInput { event, .. } if self.subscription.key => {
        self.events.push(PlatformEvent::Key(KeyInput {
          key:       event.physical_key,
          state:     event.state,
          repeat:    event.repeat,
          modifiers: *self.modifiers,
        }));
      }
      _ => {}
    }
  }
}

impl Platform for DesktopPlatform {
  type Window = DesktopWindow;

  fn init(&mut self) -> Result<(), InitError> {
    let event_loop = EventLoop::new().map_err(|e| InitError::Subsystem(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    self.event_loop = Some(event_loop);
    self.started = Some(Instant::now());
    Ok(())
  }

  fn time(&self) -> f64 {
    self
      .started
      .map(|started| started.elapsed().as_secs_f64())
      .unwrap_or(0.0)
  }

  fn create_window(&mut self, config: &WindowConfig) -> Result<DesktopWindow, InitError> {
    let event_loop = self
      .event_loop
      .as_mut()
      .ok_or_else(|| InitError::WindowCreation("windowing subsystem not started".to_string()))?;

    let attributes = Window::default_attributes()
      .with_decorations(true)
      .with_title(config.title.clone())
      .with_inner_size(LogicalSize::new(config.width, config.height));

    let mut creator = WindowCreator {
      attributes: Some(attributes),
      created:    None,
    };

    for _ in 0..RESUME_ATTEMPTS {
      if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(RESUME_POLL), &mut creator) {
        return Err(InitError::WindowCreation(format!(
          "event loop exited with code {code} before the window was created"
        )));
      }
      if creator.created.is_some() {
        break;
      }
    }

    let window = creator
      .created
      .ok_or_else(|| InitError::WindowCreation("event loop never resumed".to_string()))?
      .map_err(|e| InitError::WindowCreation(e.to_string()))?;

    Ok(DesktopWindow {
      window:          Arc::new(window),
      rcx:             None,
      subscription:    EventKinds::default(),
      clear_color:     [0.0, 0.0, 0.0, 1.0],
      close_requested: false,
    })
  }

  fn load_graphics(
    &mut self,
    window: &mut DesktopWindow,
    config: &GraphicsConfig,
  ) -> Result<GraphicsInfo, InitError> {
    let event_loop = self
      .event_loop
      .as_ref()
      .ok_or_else(|| InitError::Context("windowing subsystem not started".to_string()))?;

    let vulkan = initialize_vulkan(event_loop, config)?;
    let rcx = RenderContext::new(&vulkan, window.window.clone())?;
    let info = vulkan.graphics_info();

    window.rcx = Some(rcx);
    self.vulkan = Some(vulkan);
    Ok(info)
  }

  fn set_swap_interval(&mut self, window: &mut DesktopWindow, interval: u32) {
    if let (Some(vulkan), Some(rcx)) = (self.vulkan.as_ref(), window.rcx.as_mut()) {
      rcx.set_swap_interval(vulkan, interval);
    }
  }

  fn subscribe(&mut self, window: &mut DesktopWindow, kinds: EventKinds) {
    window.subscription = kinds;
  }

  fn set_viewport(&mut self, window: &mut DesktopWindow, viewport: ViewportRect) {
    if let Some(rcx) = window.rcx.as_mut() {
      rcx.set_viewport(Viewport {
        offset:      [viewport.x as f32, viewport.y as f32],
        extent:      [viewport.width as f32, viewport.height as f32],
        depth_range: 0.0..=1.0,
      });
    }
  }

  fn clear(&mut self, window: &mut DesktopWindow, color: [f32; 4]) {
    window.clear_color = color;
  }

  fn swap_buffers(&mut self, window: &mut DesktopWindow) {
    let (Some(vulkan), Some(rcx)) = (self.vulkan.as_ref(), window.rcx.as_mut()) else {
      return;
    };

    if let Err(diagnostic) = rcx.draw_frame(vulkan, window.clear_color) {
      self.pending.push(PlatformEvent::Error(diagnostic));
    }
  }

  fn poll_events(&mut self, window: &mut DesktopWindow) -> Vec<PlatformEvent> {
    let mut events = std::mem::take(&mut self.pending);
    let Some(event_loop) = self.event_loop.as_mut() else {
      return events;
    };

    let mut collector = EventCollector {
      window_id:       window.window.id(),
      subscription:    window.subscription,
      modifiers:       &mut self.modifiers,
      events:          Vec::new(),
      close_requested: false,
    };

    if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut collector) {
      debug!(code, "event loop exited");
      collector.close_requested = true;
    }

    window.close_requested |= collector.close_requested;
    events.extend(collector.events);
    events
  }

  fn should_close(&self, window: &DesktopWindow) -> bool {
    window.close_requested
  }

  fn destroy_window(&mut self, mut window: DesktopWindow) {
    if let Some(mut rcx) = window.rcx.take() {
      if let Some(mut previous_frame_end) = rcx.previous_frame_end.take() {
        previous_frame_end.cleanup_finished();
      }
    }
    if !self.pending.is_empty() {
      warn!("dropping {} undelivered platform diagnostics", self.pending.len());
      self.pending.clear();
    }
  }

  fn terminate(&mut self) {
    self.vulkan = None;
    self.event_loop = None;
    self.started = None;
  }
}
