//! ESP32 clock on the ESP-IDF high resolution timer.

use crate::traits::Clock;

/// Clock reading `esp_timer_get_time()` (microseconds since boot).
///
/// Used by [`RampedStepper`](crate::stepper::RampedStepper) for step timing,
/// so it reports microseconds natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

impl EspClock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for EspClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    #[inline]
    fn now_us(&self) -> u64 {
        // Safe: plain read of the hardware timer
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        micros.max(0) as u64
    }
}
