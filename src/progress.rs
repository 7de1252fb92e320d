use parking_lot::Mutex;
use tracing::info;

/// Monotonic count of successfully loaded records, shared across
/// completion callbacks.
///
/// Emits one log line every time the running total crosses a multiple of
/// the configured cadence. Observability only; dispatch correctness does
/// not depend on it.
pub struct ProgressTracker {
  completed: Mutex<u64>,
  cadence: u64,
}

impl ProgressTracker {
  pub fn new(cadence: u64) -> Self {
    Self {
      completed: Mutex::new(0),
      cadence: cadence.max(1),
    }
  }

  /// Records `units` newly completed records, logging if the total
  /// crossed a cadence boundary.
  pub fn record(&self, units: u64) {
    let mut completed = self.completed.lock();
    let previous = *completed;
    *completed += units;
    if previous / self.cadence != *completed / self.cadence {
      info!(processed = *completed, "Progress update.");
    }
  }

  pub fn completed(&self) -> u64 {
    *self.completed.lock()
  }
}
