//! In-memory platform for host tests, fuzzing and demos.
//!
//! [`SimGpio`] keeps one atomic level per pin, so a test thread can toggle
//! the sync input while the polling task reads it.  [`SimClock`] only moves
//! when told to.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};

use crate::app::ports::{ClockSource, GpioPort, Micros, PinId};
use crate::error::HardwareFault;

const PIN_COUNT: usize = 64;

/// Simulated GPIO bank.
#[derive(Debug)]
pub struct SimGpio {
    levels: [AtomicBool; PIN_COUNT],
    outputs: AtomicU64,
    inputs: AtomicU64,
    /// Pin whose configuration fails, or -1.
    fail_pin: AtomicI32,
    /// Writes to pins never configured as outputs.
    stray_writes: AtomicU32,
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGpio {
    pub fn new() -> Self {
        Self {
            levels: [const { AtomicBool::new(false) }; PIN_COUNT],
            outputs: AtomicU64::new(0),
            inputs: AtomicU64::new(0),
            fail_pin: AtomicI32::new(-1),
            stray_writes: AtomicU32::new(0),
        }
    }

    /// Make configuration of `pin` fail with code -1 (`-1` clears).
    pub fn fail_configure(&self, pin: PinId) {
        self.fail_pin.store(pin, Ordering::Relaxed);
    }

    /// Drive an input from the outside world.
    pub fn set_input(&self, pin: PinId, high: bool) {
        if let Some(level) = self.slot(pin) {
            level.store(high, Ordering::Release);
        }
    }

    /// Current level of `pin`.
    pub fn level(&self, pin: PinId) -> bool {
        self.slot(pin).is_some_and(|l| l.load(Ordering::Acquire))
    }

    pub fn is_output(&self, pin: PinId) -> bool {
        Self::bit(pin).is_some_and(|b| self.outputs.load(Ordering::Relaxed) & b != 0)
    }

    pub fn is_input(&self, pin: PinId) -> bool {
        Self::bit(pin).is_some_and(|b| self.inputs.load(Ordering::Relaxed) & b != 0)
    }

    pub fn stray_writes(&self) -> u32 {
        self.stray_writes.load(Ordering::Relaxed)
    }

    fn slot(&self, pin: PinId) -> Option<&AtomicBool> {
        usize::try_from(pin).ok().and_then(|i| self.levels.get(i))
    }

    fn bit(pin: PinId) -> Option<u64> {
        u32::try_from(pin).ok().and_then(|p| 1u64.checked_shl(p))
    }

    fn configure(&self, pin: PinId, mask: &AtomicU64) -> Result<(), HardwareFault> {
        let bit = Self::bit(pin).ok_or(HardwareFault::PinConfig { pin, code: -1 })?;
        if self.fail_pin.load(Ordering::Relaxed) == pin {
            return Err(HardwareFault::PinConfig { pin, code: -1 });
        }
        mask.fetch_or(bit, Ordering::Relaxed);
        Ok(())
    }
}

impl GpioPort for SimGpio {
    fn configure_output(&self, pin: PinId) -> Result<(), HardwareFault> {
        self.configure(pin, &self.outputs)
    }

    fn configure_sync_input(&self, pin: PinId) -> Result<(), HardwareFault> {
        self.configure(pin, &self.inputs)
    }

    fn write(&self, pin: PinId, high: bool) {
        if !self.is_output(pin) {
            self.stray_writes.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if let Some(level) = self.slot(pin) {
            level.store(high, Ordering::Release);
        }
    }

    fn read(&self, pin: PinId) -> bool {
        self.level(pin)
    }
}

/// Hand-driven clock.
#[derive(Debug, Default)]
pub struct SimClock {
    now: AtomicU32,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Micros) {
        self.now.store(now, Ordering::Release);
    }

    pub fn advance(&self, by: Micros) -> Micros {
        self.now.fetch_add(by, Ordering::AcqRel).wrapping_add(by)
    }
}

impl ClockSource for SimClock {
    fn now_us(&self) -> Micros {
        self.now.load(Ordering::Acquire)
    }
}
