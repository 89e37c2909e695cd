//! Monotonic clock backed by `std::time::Instant`.

use std::time::Instant;

use crate::traits::Clock;

/// Wall-clock time since creation.
///
/// Cheap to copy; copies share the same epoch.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Clock whose epoch is now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Clock with an explicit epoch, to share a time base with other code.
    pub fn starting_at(epoch: Instant) -> Self {
        Self { epoch }
    }

    /// The epoch.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}
