//! Dimmer engine: channel table, zero-cross monitor, phase scheduler and
//! the Control API.
//!
//! ```text
//!   ┌──────────── Arc<Shared> ────────────┐
//!   │ gpio · clock · SyncState (atomics)  │
//!   │ Quiescence · ChannelTable (cell)    │
//!   └──────▲─────────────────────▲────────┘
//!          │                     │
//!     Dimmer (control)     PhaseScheduler (tick path)
//!     &mut self, pauses    unique, driven by a TickDriver
//! ```
//!
//! The channel table is the only non-atomic shared state.  The tick path
//! reaches it while holding a [`quiesce::TickGuard`]; the control path only
//! while holding a [`quiesce::PauseGuard`].  The handshake makes the two
//! mutually exclusive.
//!
//! Each `Dimmer` owns its own `Shared`, so independent controllers can
//! coexist in one process.

pub mod channel;
pub mod level;
pub mod quiesce;
pub mod scheduler;
pub mod snapshot;
pub mod sync;

use core::cell::UnsafeCell;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app::ports::{ClockSource, GpioPort, Micros, PinId, TickDriver};
use crate::config::DimmerConfig;
use crate::error::{DimmerError, Result};

pub use channel::{ChannelTable, DimmerChannel, DimmerMode, MAX_CHANNELS};
pub use scheduler::{EdgeLatch, PhaseScheduler, Tick};
pub use snapshot::{ChannelState, DebugSnapshot};
pub use sync::{Crossing, SyncStatus};

use quiesce::{PauseGuard, Quiescence, TickGuard};
use sync::SyncState;

// ───────────────────────────────────────────────────────────────
// Shared context
// ───────────────────────────────────────────────────────────────

pub(crate) struct Shared<G, C> {
    pub(crate) gpio: G,
    pub(crate) clock: C,
    pub(crate) sync: SyncState,
    pub(crate) quiesce: Quiescence,
    table: UnsafeCell<ChannelTable>,
}

// SAFETY: every field but `table` is Sync on its own.  `table` is only
// reached through `tick_table` / `paused_table`, which demand a unique
// borrow of a guard from the quiescence handshake; the handshake never
// lets a tick guard and a pause guard exist at the same time, and each
// side has a single owner (`PhaseScheduler`, `Dimmer`).
unsafe impl<G: Sync, C: Sync> Sync for Shared<G, C> {}

impl<G, C> Shared<G, C> {
    fn new(gpio: G, clock: C) -> Self {
        Self {
            gpio,
            clock,
            sync: SyncState::new(),
            quiesce: Quiescence::new(),
            table: UnsafeCell::new(ChannelTable::new()),
        }
    }

    /// Channel table for the duration of one tick.
    #[allow(clippy::mut_from_ref)]
    pub(crate) fn tick_table<'a>(&'a self, _guard: &'a mut TickGuard<'_>) -> &'a mut ChannelTable {
        // SAFETY: see the `Sync` impl above.
        unsafe { &mut *self.table.get() }
    }

    /// Channel table while the tick path is parked.
    #[allow(clippy::mut_from_ref)]
    pub(crate) fn paused_table<'a>(&'a self, _guard: &'a mut PauseGuard<'_>) -> &'a mut ChannelTable {
        // SAFETY: see the `Sync` impl above.
        unsafe { &mut *self.table.get() }
    }
}

// ───────────────────────────────────────────────────────────────
// Control API
// ───────────────────────────────────────────────────────────────

/// Settings fixed by a successful `setup`.
#[derive(Debug, Clone)]
struct Active {
    sync_pin: PinId,
    config: DimmerConfig,
}

/// Control handle of one dimmer controller.
///
/// Methods that touch the channel table take `&mut self`, so pause
/// requests never overlap.  Wrap it in a mutex to share it between
/// tasks.
pub struct Dimmer<G: GpioPort, C: ClockSource> {
    shared: Arc<Shared<G, C>>,
    active: Option<Active>,
    /// Control-side copy of the configured pins, in table order.
    pins: heapless::Vec<PinId, MAX_CHANNELS>,
}

impl<G: GpioPort, C: ClockSource> Dimmer<G, C> {
    pub fn new(gpio: G, clock: C) -> Self {
        Self {
            shared: Arc::new(Shared::new(gpio, clock)),
            active: None,
            pins: heapless::Vec::new(),
        }
    }

    /// Configure the sync input, reset sync state and start the tick path.
    ///
    /// Call once.  On failure nothing is committed and `setup` may be
    /// retried.
    pub fn setup<D: TickDriver<G, C>>(
        &mut self,
        sync_pin: PinId,
        config: DimmerConfig,
        driver: &mut D,
    ) -> Result<()> {
        if self.active.is_some() {
            return Err(DimmerError::InvalidArgument("setup already called"));
        }
        config.validate()?;
        config.check_pin(sync_pin)?;

        let shared = &self.shared;
        shared.gpio.configure_sync_input(sync_pin).inspect_err(|e| {
            warn!("Dimmer: sync GPIO {} config failed: {}", sync_pin, e);
        })?;
        shared.sync.reset(shared.clock.now_us());

        let scheduler = PhaseScheduler::new(Arc::clone(shared), sync_pin, &config);
        if let Err(e) = driver.start(scheduler) {
            warn!("Dimmer: tick driver failed to start: {}", e);
            // Back to the pristine state of a never-set-up controller.
            shared.sync.reset(0);
            return Err(e);
        }

        info!(
            "Dimmer: sync on GPIO {}, nominal {} Hz, accepting {}..{} Hz",
            sync_pin, config.nominal_mains_hz, config.min_mains_hz, config.max_mains_hz
        );
        self.active = Some(Active { sync_pin, config });
        Ok(())
    }

    pub fn is_setup(&self) -> bool {
        self.active.is_some()
    }

    /// Configure `pin` as a dimmer output, initially off.
    ///
    /// Adding a pin that is already dimmed is a no-op; its mode and level
    /// are kept.
    pub fn add(&mut self, pin: PinId, mode: DimmerMode) -> Result<()> {
        let active = self.active()?;
        active.config.check_pin(pin)?;
        if pin == active.sync_pin {
            return Err(DimmerError::InvalidArgument("pin is the sync input"));
        }
        if self.pins.contains(&pin) {
            return Ok(());
        }
        if self.pins.is_full() {
            return Err(DimmerError::TableFull);
        }

        self.shared.gpio.configure_output(pin)?;
        self.shared.gpio.write(pin, false);
        let channel = DimmerChannel::new(pin, mode, self.basis_us()?);

        {
            let mut guard = self.pause()?;
            self.shared.paused_table(&mut guard).insert(channel)?;
        }
        self.pins.push(pin).map_err(|_| DimmerError::TableFull)?;

        info!("Dimmer: added GPIO {} ({:?})", pin, mode);
        Ok(())
    }

    /// Stop dimming `pin` and drive it low.
    pub fn remove(&mut self, pin: PinId) -> Result<()> {
        self.active()?;
        if !self.pins.contains(&pin) {
            return Err(DimmerError::UnknownChannel(pin));
        }

        {
            let mut guard = self.pause()?;
            self.shared.paused_table(&mut guard).remove(pin);
        }
        self.shared.gpio.write(pin, false);
        self.pins.retain(|&p| p != pin);

        info!("Dimmer: removed GPIO {}", pin);
        Ok(())
    }

    /// Set brightness in promille.  Values outside `0..=1000` saturate.
    ///
    /// Takes effect at the next tick: a threshold moved behind the elapsed
    /// time fires at once, otherwise at the new threshold.
    pub fn set_level(&mut self, pin: PinId, promille: i32) -> Result<()> {
        self.active()?;
        if !self.pins.contains(&pin) {
            return Err(DimmerError::UnconfiguredChannel(pin));
        }
        let promille = level::clamp_promille(promille);
        let basis = self.basis_us()?;

        let level_us = {
            let mut guard = self.pause()?;
            let table = self.shared.paused_table(&mut guard);
            let channel = table
                .get_mut(pin)
                .ok_or(DimmerError::UnconfiguredChannel(pin))?;
            channel.set_promille(promille, basis);
            channel.level_us()
        };

        debug!("Dimmer: GPIO {} -> {} promille (level {} us)", pin, promille, level_us);
        Ok(())
    }

    /// Mains frequency in Hz from the last measured half-cycle, 0 when
    /// undetected.
    pub fn mains_frequency(&self) -> f32 {
        self.shared.sync.status().mains_frequency()
    }

    /// Sync counters without pausing the tick path.
    pub fn sync_status(&self) -> SyncStatus {
        self.shared.sync.status()
    }

    /// Configured pins in table order.
    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }

    /// Copy the channel table under quiescence, then dump it at debug level.
    pub fn list_debug(&mut self) -> Result<DebugSnapshot> {
        let snapshot = {
            let mut guard = self.pause()?;
            let table = self.shared.paused_table(&mut guard);
            DebugSnapshot::capture(self.shared.sync.status(), table)
        };
        debug!("Dimmer: {}", snapshot);
        Ok(snapshot)
    }

    // ── Internal ──────────────────────────────────────────────────

    fn active(&self) -> Result<&Active> {
        self.active.as_ref().ok_or(DimmerError::NotInitialized)
    }

    /// Half-cycle used for new thresholds: measured, else nominal.
    fn basis_us(&self) -> Result<Micros> {
        let period = self.shared.sync.period();
        if period != 0 {
            return Ok(period);
        }
        Ok(self.active()?.config.nominal_half_period_us())
    }

    fn pause(&self) -> Result<PauseGuard<'_>> {
        let timeout = self
            .active
            .as_ref()
            .map_or(DimmerConfig::default().quiesce_timeout_us, |a| {
                a.config.quiesce_timeout_us
            });
        self.shared
            .quiesce
            .pause(&self.shared.clock, timeout)
            .inspect_err(|e| warn!("Dimmer: {}", e))
    }
}
