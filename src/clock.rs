/// Timestamps of the previous and current frame, in seconds since the
/// windowing subsystem started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
  last_frame_time: f64,
  this_frame_time: f64,
}

impl FrameClock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records `now` as the current frame time and returns the time elapsed
  /// since the previous call. Samples older than the current frame are
  /// treated as `this_frame_time` so the clock never runs backwards.
  pub fn advance(&mut self, now: f64) -> f64 {
    self.last_frame_time = self.this_frame_time;
    self.this_frame_time = now.max(self.this_frame_time);
    self.this_frame_time - self.last_frame_time
  }

  /// Time of the current frame.
  pub fn elapsed(&self) -> f64 {
    self.this_frame_time
  }

  pub fn last_frame_time(&self) -> f64 {
    self.last_frame_time
  }
}
