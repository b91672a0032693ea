//! Monotonic microsecond clock.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()`, the ESP-IDF
//!   high-resolution timer (ISR-safe, monotonic).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for host-side
//!   testing and simulation.
//!
//! Both are truncated to the wrapping 32-bit [`Micros`] the engine uses.

use crate::app::ports::{ClockSource, Micros};

/// Platform clock for the dimmer engine.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Full 64-bit microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: read-only query of the high-resolution timer; ISR-safe.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Full 64-bit microseconds since the clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockSource for MonotonicClock {
    #[inline]
    fn now_us(&self) -> Micros {
        self.uptime_us() as Micros
    }
}
