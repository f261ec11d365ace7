use std::{cell::Cell, collections::VecDeque, ffi::OsString};

use glbp::{
  App,
  AppConfig,
  Diagnostic,
  EventKinds,
  GraphicsInfo,
  InitError,
  KeyInput,
  LifecycleState,
  Platform,
  PlatformEvent,
  ViewportRect,
  config::{GraphicsConfig, WindowConfig},
};
use winit::{
  event::ElementState,
  keyboard::{KeyCode, ModifiersState, PhysicalKey},
};

const FRAME: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
  Init,
  CreateWindow,
  LoadGraphics,
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
  Init,
  CreateWindow(u32, u32, String),
  LoadGraphics(u32, u32),
  SwapInterval(u32),
  Subscribe(EventKinds),
  Viewport(ViewportRect),
  Clear([f32; 4]),
  Swap,
  Poll,
  DestroyWindow,
  Terminate,
}

struct MockWindow;

/// Scripted platform: fails at a chosen step, hands out one batch of events
/// per poll and reports a close request after a fixed number of polls.
#[derive(Default)]
struct MockPlatform {
  fail_at:          Option<Step>,
  close_after_poll: Option<usize>,
  script:           VecDeque<Vec<PlatformEvent>>,
  calls:            Vec<Call>,
  polls:            usize,
  now:              Cell<f64>,
}

impl MockPlatform {
  fn closing_after(polls: usize) -> Self {
    Self {
      close_after_poll: Some(polls),
      ..Self::default()
    }
  }

  fn failing_at(step: Step) -> Self {
    Self {
      fail_at: Some(step),
      ..Self::default()
    }
  }

  fn with_events(mut self, batches: Vec<Vec<PlatformEvent>>) -> Self {
    self.script = batches.into();
    self
  }

  fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
    self.calls.iter().filter(|call| pred(call)).count()
  }

  fn clears(&self) -> Vec<[f32; 4]> {
    self
      .calls
      .iter()
      .filter_map(|call| match call {
        Call::Clear(color) => Some(*color),
        _ => None,
      })
      .collect()
  }

  fn viewports(&self) -> Vec<ViewportRect> {
    self
      .calls
      .iter()
      .filter_map(|call| match call {
        Call::Viewport(viewport) => Some(*viewport),
        _ => None,
      })
      .collect()
  }
}

impl Platform for MockPlatform {
  type Window = MockWindow;

  fn init(&mut self) -> Result<(), InitError> {
    self.calls.push(Call::Init);
    if self.fail_at == Some(Step::Init) {
      return Err(InitError::Subsystem("no display".into()));
    }
    Ok(())
  }

  fn time(&self) -> f64 {
    let now = self.now.get() + FRAME;
    self.now.set(now);
    now
  }

  fn create_window(&mut self, config: &WindowConfig) -> Result<MockWindow, InitError> {
    self.calls.push(Call::CreateWindow(
      config.width,
      config.height,
      config.title.clone(),
    ));
    if self.fail_at == Some(Step::CreateWindow) {
      return Err(InitError::WindowCreation("out of surfaces".into()));
    }
    Ok(MockWindow)
  }

  fn load_graphics(
    &mut self,
    _window: &mut MockWindow,
    config: &GraphicsConfig,
  ) -> Result<GraphicsInfo, InitError> {
    self
      .calls
      .push(Call::LoadGraphics(config.api_major, config.api_minor));
    if self.fail_at == Some(Step::LoadGraphics) {
      return Err(InitError::ExtensionLoad("loader missing".into()));
    }
    Ok(GraphicsInfo {
      api:      "Mock".into(),
      renderer: "mock renderer".into(),
      version:  "1.2.0".into(),
    })
  }

  fn set_swap_interval(&mut self, _window: &mut MockWindow, interval: u32) {
    self.calls.push(Call::SwapInterval(interval));
  }

  fn subscribe(&mut self, _window: &mut MockWindow, kinds: EventKinds) {
    self.calls.push(Call::Subscribe(kinds));
  }

  fn set_viewport(&mut self, _window: &mut MockWindow, viewport: ViewportRect) {
    self.calls.push(Call::Viewport(viewport));
  }

  fn clear(&mut self, _window: &mut MockWindow, color: [f32; 4]) {
    self.calls.push(Call::Clear(color));
  }

  fn swap_buffers(&mut self, _window: &mut MockWindow) {
    self.calls.push(Call::Swap);
  }

  fn poll_events(&mut self, _window: &mut MockWindow) -> Vec<PlatformEvent> {
    self.calls.push(Call::Poll);
    self.polls += 1;
    self.script.pop_front().unwrap_or_default()
  }

  fn should_close(&self, _window: &MockWindow) -> bool {
    self
      .close_after_poll
      .is_some_and(|limit| self.polls >= limit)
  }

  fn destroy_window(&mut self, _window: MockWindow) {
    self.calls.push(Call::DestroyWindow);
  }

  fn terminate(&mut self) {
    self.calls.push(Call::Terminate);
  }
}

fn execute(platform: MockPlatform) -> (App<MockPlatform>, Result<(), InitError>) {
  let mut app = App::new(platform, AppConfig::default());
  let result = app.execute(Vec::<OsString>::new(), Vec::<(OsString, OsString)>::new());
  (app, result)
}

fn resize(width: i32, height: i32) -> PlatformEvent {
  PlatformEvent::Resize { width, height }
}

#[test]
fn initialization_follows_the_fixed_sequence() {
  let (app, result) = execute(MockPlatform::closing_after(1));
  result.unwrap();

  assert_eq!(&app.platform().calls[..5], &[
    Call::Init,
    Call::CreateWindow(1920, 1080, "GLBP".into()),
    Call::LoadGraphics(1, 2),
    Call::SwapInterval(1),
    Call::Subscribe(EventKinds::ALL),
  ]);
  assert_eq!(app.state(), LifecycleState::Terminated);
}

#[test]
fn close_on_third_poll_renders_exactly_three_frames() {
  let (app, result) = execute(MockPlatform::closing_after(3));
  result.unwrap();

  let platform = app.platform();
  assert_eq!(platform.count(|c| matches!(c, Call::Clear(_))), 3);
  assert_eq!(platform.count(|c| *c == Call::Swap), 3);
  assert_eq!(platform.count(|c| *c == Call::Poll), 3);
  assert_eq!(app.frames_rendered(), 3);
  assert!(app.exit_requested());
}

#[test]
fn each_iteration_renders_then_polls() {
  let (app, _) = execute(MockPlatform::closing_after(2));

  let loop_calls: Vec<_> = app
    .platform()
    .calls
    .iter()
    .skip_while(|c| !matches!(c, Call::Clear(_)))
    .take_while(|c| **c != Call::DestroyWindow)
    .cloned()
    .collect();

  assert!(matches!(loop_calls[0], Call::Clear(_)));
  assert_eq!(loop_calls[1..3], [Call::Swap, Call::Poll]);
  assert!(matches!(loop_calls[3], Call::Clear(_)));
  assert_eq!(loop_calls[4..], [Call::Swap, Call::Poll]);
}

#[test]
fn background_is_gray_and_follows_the_clock() {
  let (app, _) = execute(MockPlatform::closing_after(4));

  let clears = app.platform().clears();
  assert_eq!(clears.len(), 4);
  for [r, g, b, a] in &clears {
    assert_eq!(r, g);
    assert_eq!(g, b);
    assert_eq!(*a, 1.0);
  }

  let last = clears[clears.len() - 1][0] as f64;
  assert!((last - app.clock().elapsed().cos()).abs() < 1e-6);
}

#[test]
fn delta_time_comes_from_one_sample_per_frame() {
  let (app, _) = execute(MockPlatform::closing_after(5));

  // One sample for the "run started" message, then one per iteration.
  let clock = app.clock();
  assert!((clock.elapsed() - 6.0 * FRAME).abs() < 1e-9);
  assert!((clock.elapsed() - clock.last_frame_time() - FRAME).abs() < 1e-9);
}

#[test]
fn degenerate_resize_clamps_to_one_pixel() {
  let platform = MockPlatform::closing_after(2).with_events(vec![vec![resize(0, 0)], vec![resize(-5, 800)]]);
  let (app, _) = execute(platform);

  assert_eq!(app.platform().viewports(), vec![
    ViewportRect {
      x:      0,
      y:      0,
      width:  1,
      height: 1,
    },
    ViewportRect {
      x:      0,
      y:      0,
      width:  1,
      height: 800,
    },
  ]);
  assert_eq!(app.viewport().map(|v| (v.width, v.height)), Some((1, 800)));
}

#[test]
fn positive_resize_passes_through() {
  let platform = MockPlatform::closing_after(1).with_events(vec![vec![resize(1280, 720)]]);
  let (app, _) = execute(platform);

  assert_eq!(app.platform().viewports(), vec![ViewportRect {
    x:      0,
    y:      0,
    width:  1280,
    height: 720,
  }]);
}

#[test]
fn window_creation_failure_skips_the_loop_but_still_cleans_up() {
  let (app, result) = execute(MockPlatform::failing_at(Step::CreateWindow));

  assert!(matches!(result, Err(InitError::WindowCreation(_))));
  let platform = app.platform();
  assert_eq!(platform.count(|c| matches!(c, Call::Clear(_))), 0);
  assert_eq!(platform.count(|c| *c == Call::Poll), 0);
  assert_eq!(platform.count(|c| *c == Call::DestroyWindow), 0);
  assert_eq!(platform.count(|c| *c == Call::Terminate), 1);
  assert_eq!(app.state(), LifecycleState::Terminated);
}

#[test]
fn extension_load_failure_destroys_the_created_window() {
  let (app, result) = execute(MockPlatform::failing_at(Step::LoadGraphics));

  assert!(matches!(result, Err(InitError::ExtensionLoad(_))));
  let platform = app.platform();
  assert_eq!(platform.count(|c| *c == Call::SwapInterval(1)), 0);
  assert_eq!(platform.count(|c| *c == Call::DestroyWindow), 1);
  assert_eq!(platform.count(|c| *c == Call::Terminate), 1);
  assert_eq!(app.frames_rendered(), 0);
}

#[test]
fn subsystem_failure_does_not_terminate_what_never_started() {
  let (app, result) = execute(MockPlatform::failing_at(Step::Init));

  assert!(matches!(result, Err(InitError::Subsystem(_))));
  assert_eq!(app.platform().calls, vec![Call::Init]);
  assert_eq!(app.state(), LifecycleState::Terminated);
}

#[test]
fn cleanup_without_initialization_touches_nothing() {
  let mut app = App::new(MockPlatform::default(), AppConfig::default());
  app.cleanup();

  assert!(app.platform().calls.is_empty());
  assert_eq!(app.state(), LifecycleState::Terminated);

  app.cleanup();
  assert!(app.platform().calls.is_empty());
}

#[test]
fn cleanup_runs_once() {
  let (mut app, _) = execute(MockPlatform::closing_after(1));
  app.cleanup();

  let platform = app.platform();
  assert_eq!(platform.count(|c| *c == Call::DestroyWindow), 1);
  assert_eq!(platform.count(|c| *c == Call::Terminate), 1);
}

#[test]
fn run_is_refused_after_failed_initialization() {
  let mut app = App::new(MockPlatform::failing_at(Step::CreateWindow), AppConfig::default());
  assert!(app.initialize(Vec::new(), Vec::new()).is_err());
  assert_eq!(app.state(), LifecycleState::InitFailed);

  app.run();
  assert_eq!(app.frames_rendered(), 0);
  assert!(!app.exit_requested());
}

#[test]
fn exit_flag_set_before_run_prevents_any_frame() {
  let mut app = App::new(MockPlatform::default(), AppConfig::default());
  app.initialize(Vec::new(), Vec::new()).unwrap();
  app.request_exit();
  app.run();
  app.cleanup();

  assert_eq!(app.frames_rendered(), 0);
  assert!(app.exit_requested());
  assert_eq!(app.platform().count(|c| *c == Call::Poll), 0);
}

#[test]
fn diagnostics_and_keys_do_not_stop_the_loop() {
  let key = PlatformEvent::Key(KeyInput {
    key:       PhysicalKey::Code(KeyCode::Escape),
    state:     ElementState::Pressed,
    repeat:    false,
    modifiers: ModifiersState::empty(),
  });
  let platform = MockPlatform::closing_after(3).with_events(vec![
    vec![PlatformEvent::Error(Diagnostic::new(0x10002, "acquire failed"))],
    vec![key],
  ]);
  let (app, result) = execute(platform);

  result.unwrap();
  assert_eq!(app.frames_rendered(), 3);
  assert!(app.platform().viewports().is_empty());
}

#[test]
fn configured_window_parameters_reach_the_platform() {
  let mut config = AppConfig::default();
  config.window.title = "sandbox".into();
  config.window.width = 800;
  config.window.height = 600;
  config.graphics.swap_interval = 0;

  let mut app = App::new(MockPlatform::closing_after(1), config);
  app.execute(Vec::new(), Vec::new()).unwrap();

  let calls = &app.platform().calls;
  assert!(calls.contains(&Call::CreateWindow(800, 600, "sandbox".into())));
  assert!(calls.contains(&Call::SwapInterval(0)));
}

#[test]
fn initialize_after_execute_is_refused_without_platform_calls() {
  let (mut app, result) = execute(MockPlatform::closing_after(1));
  result.unwrap();
  let calls_before = app.platform().calls.len();

  let err = app.initialize(Vec::new(), Vec::new()).unwrap_err();

  assert!(matches!(err, InitError::InvalidState(_)));
  assert_eq!(app.platform().calls.len(), calls_before);
  assert_eq!(app.state(), LifecycleState::Terminated);
}

#[test]
fn second_initialize_keeps_the_live_window() {
  let mut app = App::new(MockPlatform::closing_after(1), AppConfig::default());
  app.initialize(Vec::new(), Vec::new()).unwrap();

  let err = app.initialize(Vec::new(), Vec::new()).unwrap_err();
  assert!(matches!(err, InitError::InvalidState(_)));
  assert_eq!(app.state(), LifecycleState::Running);
  assert_eq!(app.platform().count(|c| *c == Call::Init), 1);
  assert_eq!(app.platform().count(|c| matches!(c, Call::CreateWindow(..))), 1);

  app.run();
  app.cleanup();
  assert_eq!(app.frames_rendered(), 1);
  assert_eq!(app.platform().count(|c| *c == Call::DestroyWindow), 1);
  assert_eq!(app.platform().count(|c| *c == Call::Terminate), 1);
}

#[test]
fn execute_twice_leaves_the_finished_app_alone() {
  let (mut app, _) = execute(MockPlatform::closing_after(2));
  let calls_before = app.platform().calls.len();

  let result = app.execute(Vec::new(), Vec::new());

  assert!(matches!(result, Err(InitError::InvalidState(_))));
  assert_eq!(app.platform().calls.len(), calls_before);
  assert_eq!(app.frames_rendered(), 2);
}
