//! Application lifecycle controller.
//!
//! This module sequences the whole life of the process:
//! * Environment inspection (arguments and variables are logged, never parsed)
//! * Graphics initialization: subsystem, window, context, vertical sync
//! * Input initialization: key and framebuffer-resize delivery
//! * The run loop
//! * Teardown
//!
//! # Frame Loop
//! Each iteration follows this sequence:
//! 1. Check the exit flag; stop if it is set
//! 2. Sample the platform clock once and derive the frame delta
//! 3. Tick the simulation
//! 4. Clear to the pulsing gray background and present
//! 5. Poll platform events, run callbacks, check for a close request
//!
//! # States
//! ```text
//! Uninitialized -> Initializing -> Running ----> Terminating -> Terminated
//!                              \-> InitFailed -/
//! ```
//! `Uninitialized -> Terminating` is also allowed so a controller that was
//! never initialized can still be cleaned up.

use std::ffi::OsString;

use tracing::{debug, error, info, trace, warn};

use crate::{
  clock::FrameClock,
  config::AppConfig,
  error::{Diagnostic, InitError},
  platform::{EventKinds, KeyInput, Platform, PlatformEvent, ViewportRect},
  render::{background_color, framebuffer_viewport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Uninitialized,
  Initializing,
  Running,
  InitFailed,
  Terminating,
  Terminated,
}

impl LifecycleState {
  pub fn can_transition_to(self, next: LifecycleState) -> bool {
    use LifecycleState::*;

    matches!(
      (self, next),
      (Uninitialized, Initializing)
        | (Uninitialized, Terminating)
        | (Initializing, Running)
        | (Initializing, InitFailed)
        | (Running, Terminating)
        | (InitFailed, Terminating)
        | (Terminating, Terminated)
    )
  }
}

/// Owns the window, the frame clock and the lifecycle flags, and drives a
/// [`Platform`] through initialization, the run loop and teardown.
///
/// # Example Usage
/// ```no_run
/// use glbp::{App, AppConfig, desktop::DesktopPlatform};
///
/// let mut app = App::new(DesktopPlatform::new(), AppConfig::default());
/// let _ = app.execute(std::env::args_os(), std::env::vars_os());
/// ```
pub struct App<P: Platform> {
  platform: P,
  config:   AppConfig,
  state:    LifecycleState,

  // Window and timing
  window: Option<P::Window>,
  clock:  FrameClock,

  // Flags
  exit_requested:  bool,
  subsystem_ready: bool,

  // Diagnostics
  viewport:        Option<ViewportRect>,
  frames_rendered: u64,
}

impl<P: Platform> App<P> {
  pub fn new(platform: P, config: AppConfig) -> Self {
    App {
      platform,
      config,
      state: LifecycleState::Uninitialized,
      window: None,
      clock: FrameClock::new(),
      exit_requested: false,
      subsystem_ready: false,
      viewport: None,
      frames_rendered: 0,
    }
  }

  /// Runs the full lifecycle: initialize, run when initialization
  /// succeeded, then clean up no matter what. Returns the initialization
  /// result. An application that was already started is left untouched.
  pub fn execute<A, V>(&mut self, args: A, vars: V) -> Result<(), InitError>
  where
    A: IntoIterator<Item = OsString>,
    V: IntoIterator<Item = (OsString, OsString)>,
  {
    let result = self.initialize(args, vars);
    if let Err(InitError::InvalidState(_)) = result {
      return result;
    }
    if result.is_ok() {
      self.run();
    }
    self.cleanup();
    result
  }

  /// Brings up graphics and input. Stops at the first failing step and
  /// leaves whatever was created for [`App::cleanup`].
  pub fn initialize<A, V>(&mut self, args: A, vars: V) -> Result<(), InitError>
  where
    A: IntoIterator<Item = OsString>,
    V: IntoIterator<Item = (OsString, OsString)>,
  {
    if self.state != LifecycleState::Uninitialized {
      warn!("initialize refused: application is {:?}", self.state);
      return Err(InitError::InvalidState(format!("{:?}", self.state)));
    }

    self.transition(LifecycleState::Initializing);
    info!("initializing...");

    for (i, arg) in args.into_iter().enumerate() {
      debug!("argv[{}]:{}", i, arg.to_string_lossy());
    }
    for (i, (key, value)) in vars.into_iter().enumerate() {
      info!("envp[{}]:{}={}", i, key.to_string_lossy(), value.to_string_lossy());
    }

    let result = self.init_graphics().and_then(|()| self.init_input());
    match &result {
      Ok(()) => {
        info!("initialization successful.");
        self.transition(LifecycleState::Running);
      }
      Err(e) => {
        error!("{e}");
        self.transition(LifecycleState::InitFailed);
      }
    }
    result
  }

  fn init_graphics(&mut self) -> Result<(), InitError> {
    self.platform.init()?;
    self.subsystem_ready = true;

    let window = self.window.insert(self.platform.create_window(&self.config.window)?);

    let info = self.platform.load_graphics(window, &self.config.graphics)?;
    info!("Renderer: {}", info.renderer);
    info!("{} {}", info.api, info.version);

    self
      .platform
      .set_swap_interval(window, self.config.graphics.swap_interval);
    Ok(())
  }

  fn init_input(&mut self) -> Result<(), InitError> {
    let window = self
      .window
      .as_mut()
      .ok_or_else(|| InitError::WindowCreation("no window to receive input".to_string()))?;
    self.platform.subscribe(window, EventKinds::ALL);
    Ok(())
  }

  /// Blocks until the window asks to close. Does nothing unless
  /// initialization succeeded.
  pub fn run(&mut self) {
    if self.state != LifecycleState::Running || self.window.is_none() {
      warn!("run skipped: application is {:?}", self.state);
      return;
    }

    info!("run started at time {:.6}s, running...", self.platform.time());

    while !self.exit_requested {
      let delta_time = self.clock.advance(self.platform.time());

      self.tick(delta_time);
      self.render(delta_time);
      self.process_input();
    }

    info!("running complete.");
  }

  fn tick(&mut self, delta_time: f64) {
    trace!(delta_time, "tick");
  }

  fn render(&mut self, _delta_time: f64) {
    let Some(window) = self.window.as_mut() else {
      return;
    };

    let color = background_color(self.clock.elapsed());
    self.platform.clear(window, color);
    self.platform.swap_buffers(window);
    self.frames_rendered += 1;
  }

  fn process_input(&mut self) {
    let Some(window) = self.window.as_mut() else {
      self.request_exit();
      return;
    };

    for event in self.platform.poll_events(window) {
      match event {
        PlatformEvent::Key(input) => Self::on_key(&input),
        PlatformEvent::Resize { width, height } => {
          let viewport = framebuffer_viewport(width, height);
          self.platform.set_viewport(window, viewport);
          self.viewport = Some(viewport);
        }
        PlatformEvent::Error(diagnostic) => Self::on_error(&diagnostic),
      }
    }

    if self.platform.should_close(window) {
      self.request_exit();
    }
  }

  fn on_key(input: &KeyInput) {
    trace!(key = ?input.key, state = ?input.state, repeat = input.repeat, "key");
  }

  fn on_error(diagnostic: &Diagnostic) {
    error!("{diagnostic}");
  }

  /// Sets the exit flag. There is no way to clear it.
  pub fn request_exit(&mut self) {
    self.exit_requested = true;
  }

  /// Destroys the window and shuts the subsystem down, whichever of them
  /// exist. Runs once; later calls do nothing.
  pub fn cleanup(&mut self) {
    if matches!(
      self.state,
      LifecycleState::Terminating | LifecycleState::Terminated
    ) {
      return;
    }

    self.transition(LifecycleState::Terminating);
    info!("cleaning up...");

    if let Some(window) = self.window.take() {
      self.platform.destroy_window(window);
    }

    if self.subsystem_ready {
      self.platform.terminate();
      self.subsystem_ready = false;
    }

    info!("cleanup complete.");
    self.transition(LifecycleState::Terminated);
  }

  fn transition(&mut self, next: LifecycleState) {
    debug_assert!(
      self.state.can_transition_to(next),
      "illegal lifecycle transition {:?} -> {:?}",
      self.state,
      next
    );
    debug!(from = ?self.state, to = ?next, "lifecycle");
    self.state = next;
  }

  pub fn state(&self) -> LifecycleState {
    self.state
  }

  pub fn exit_requested(&self) -> bool {
    self.exit_requested
  }

  pub fn frames_rendered(&self) -> u64 {
    self.frames_rendered
  }

  /// Viewport applied by the most recent resize.
  pub fn viewport(&self) -> Option<ViewportRect> {
    self.viewport
  }

  pub fn clock(&self) -> &FrameClock {
    &self.clock
  }

  pub fn config(&self) -> &AppConfig {
    &self.config
  }

  pub fn platform(&self) -> &P {
    &self.platform
  }
}
