//! Mock hardware for integration tests.
//!
//! Records every pin write with the simulated time it happened at, so
//! tests can assert on exact switching instants without touching real
//! GPIO registers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use acdimmer::adapters::sim::SimClock;
use acdimmer::app::ports::{ClockSource, GpioPort, Micros, PinId};
use acdimmer::drivers::external::ExternalTick;
use acdimmer::{Dimmer, DimmerConfig, HardwareFault, PhaseScheduler};

pub const SYNC: PinId = 4;

// ── Write record ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub at: Micros,
    pub pin: PinId,
    pub high: bool,
}

// ── RecordingGpio ─────────────────────────────────────────────

pub struct RecordingGpio {
    clock: Arc<SimClock>,
    sync_level: AtomicBool,
    pub configured: Mutex<Vec<PinId>>,
    pub writes: Mutex<Vec<PinWrite>>,
}

#[allow(dead_code)]
impl RecordingGpio {
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            sync_level: AtomicBool::new(false),
            configured: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn set_sync(&self, high: bool) {
        self.sync_level.store(high, Ordering::Relaxed);
    }

    /// Last level written to `pin` (low if never written).
    pub fn level(&self, pin: PinId) -> bool {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|w| w.pin == pin)
            .is_some_and(|w| w.high)
    }

    /// Writes to `pin` in `[from, to)`.
    pub fn writes_between(&self, pin: PinId, from: Micros, to: Micros) -> Vec<PinWrite> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.pin == pin && w.at >= from && w.at < to)
            .copied()
            .collect()
    }

    /// Level of `pin` as of time `at`.
    pub fn level_at(&self, pin: PinId, at: Micros) -> bool {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.pin == pin && w.at <= at)
            .last()
            .is_some_and(|w| w.high)
    }

    pub fn is_configured(&self, pin: PinId) -> bool {
        self.configured.lock().unwrap().contains(&pin)
    }
}

impl GpioPort for RecordingGpio {
    fn configure_output(&self, pin: PinId) -> Result<(), HardwareFault> {
        self.configured.lock().unwrap().push(pin);
        Ok(())
    }

    fn configure_sync_input(&self, pin: PinId) -> Result<(), HardwareFault> {
        self.configured.lock().unwrap().push(pin);
        Ok(())
    }

    fn write(&self, pin: PinId, high: bool) {
        self.writes.lock().unwrap().push(PinWrite {
            at: self.clock.now_us(),
            pin,
            high,
        });
    }

    fn read(&self, _pin: PinId) -> bool {
        self.sync_level.load(Ordering::Relaxed)
    }
}

// ── Rig: dimmer + hand-stepped scheduler ──────────────────────

pub type Gpio = Arc<RecordingGpio>;
pub type Clock = Arc<SimClock>;

pub struct Rig {
    pub dimmer: Dimmer<Gpio, Clock>,
    pub scheduler: PhaseScheduler<Gpio, Clock>,
    pub gpio: Gpio,
    pub clock: Clock,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(DimmerConfig::default())
    }

    pub fn with_config(config: DimmerConfig) -> Self {
        let clock = Arc::new(SimClock::new());
        let gpio = Arc::new(RecordingGpio::new(Arc::clone(&clock)));
        let mut dimmer = Dimmer::new(Arc::clone(&gpio), Arc::clone(&clock));
        let mut tick = ExternalTick::new();
        dimmer.setup(SYNC, config, &mut tick).unwrap();
        let scheduler = tick.take().unwrap();
        Self {
            dimmer,
            scheduler,
            gpio,
            clock,
        }
    }

    /// Produce a rising sync edge at `at` (pull mode).
    pub fn edge_at(&mut self, at: Micros) {
        self.clock.set(at);
        self.gpio.set_sync(false);
        self.scheduler.poll();
        self.gpio.set_sync(true);
        self.scheduler.poll();
    }

    /// Poll every `step` µs from now until `until` (inclusive).
    pub fn run_to(&mut self, until: Micros, step: Micros) {
        while self.clock.now_us() < until {
            let next = (self.clock.now_us() + step).min(until);
            self.clock.set(next);
            self.scheduler.poll();
        }
    }

    /// Edges every `period` µs starting at `first`, `count` of them,
    /// polling every 10 µs in between.  Returns the last crossing time.
    pub fn mains(&mut self, first: Micros, period: Micros, count: u32) -> Micros {
        let mut t = first;
        for i in 0..count {
            if i > 0 {
                self.run_to(t - 10, 10);
            }
            self.edge_at(t);
            t += period;
        }
        t - period
    }
}
