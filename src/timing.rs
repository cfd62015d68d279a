//! Timing primitives.

use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use chashmap::CHashMap;

/// A timer for measuring the average time spent on a particular operation,
/// for computing debug timings.
///
/// This timer can keep track of several different operations, each of which is
/// tracked by a string "tag", such as `schedule::dispatch`. It is shared
/// between the scheduler and the visibility engine through an `Arc`.
pub struct SystemTimer {
  table: CHashMap<&'static str, Sample>,
  keys: Mutex<Vec<&'static str>>,
}

#[derive(Copy, Clone, Default)]
struct Sample {
  total_time: Duration,
  calls: u32,
}

impl SystemTimer {
  /// Creates a new `SystemTimer`.
  pub fn new() -> Self {
    Self {
      table: CHashMap::new(),
      keys: Mutex::new(Vec::new()),
    }
  }

  /// Starts a timing measurement for `system`.
  ///
  /// The measurement is completed when the returned guard value is dropped,
  /// which will then be added to the running total.
  #[must_use]
  pub fn start(&self, system: &'static str) -> SystemTimerGuard<'_> {
    let keys = &self.keys;
    self.table.upsert(
      system,
      move || {
        keys.lock().unwrap_or_else(|e| e.into_inner()).push(system);
        Sample::default()
      },
      |_| {},
    );
    SystemTimerGuard {
      timer: self,
      system,
      started: Instant::now(),
    }
  }

  /// Returns the total time measured by this timer for `system`.
  pub fn total_time(&self, system: &'static str) -> Duration {
    self
      .table
      .get(system)
      .map(|s| s.total_time)
      .unwrap_or_default()
  }

  /// Returns how many measurements have completed for `system`.
  pub fn calls(&self, system: &'static str) -> u32 {
    self.table.get(system).map(|s| s.calls).unwrap_or(0)
  }

  /// Returns the average time per measurement of `system`, or zero if it was
  /// never measured.
  pub fn average(&self, system: &'static str) -> Duration {
    match self.table.get(system) {
      Some(s) if s.calls > 0 => s.total_time / s.calls,
      _ => Duration::default(),
    }
  }

  /// Returns `(system, average, calls)` for every system tracked by `self`,
  /// in the order they were first measured.
  pub fn report(&self) -> Vec<(&'static str, Duration, u32)> {
    let keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
    keys
      .iter()
      .map(|&system| (system, self.average(system), self.calls(system)))
      .collect()
  }
}

impl Default for SystemTimer {
  fn default() -> Self {
    Self::new()
  }
}

/// A guard for a [`SystemTimer::start()`] call.
pub struct SystemTimerGuard<'a> {
  timer: &'a SystemTimer,
  system: &'static str,
  started: Instant,
}

impl SystemTimerGuard<'_> {
  /// Finishes a timing early.
  pub fn finish(self) {}
}

impl Drop for SystemTimerGuard<'_> {
  fn drop(&mut self) {
    if let Some(mut sample) = self.timer.table.get_mut(self.system) {
      sample.total_time += self.started.elapsed();
      sample.calls += 1;
    }
  }
}
