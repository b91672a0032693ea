//! Real-time phase scheduler.
//!
//! ## Half-cycle
//!
//! ```text
//!   crossing                      level_us                    crossing
//!      │◀──────── start state ──────▶│◀──── switched state ─────▶│
//!      │  trailing: ON, leading: OFF │ trailing: OFF, leading: ON│
//! ```
//!
//! At every accepted crossing each channel is driven to its start state
//! and re-armed.  Every tick afterwards, each armed channel whose threshold
//! has passed is driven to its switched state exactly once.
//!
//! ## Two tick strategies, one algorithm
//!
//! - **Pull** ([`PhaseScheduler::poll`]): a pinned task calls this in a
//!   tight loop; the sync input is sampled here whenever the debounce gate
//!   is open.
//! - **Push** ([`PhaseScheduler::on_timer_tick`]): a hardware timer ISR
//!   calls this every tick; a GPIO edge ISR latches crossings through an
//!   [`EdgeLatch`].
//!
//! Both funnel into the same `advance` step.  Nothing here blocks,
//! allocates or logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::{ClockSource, GpioPort, Micros, PinId};
use crate::config::DimmerConfig;

use super::Shared;
use super::channel::ChannelTable;
use super::level::FULL_SCALE;
use super::sync::{Crossing, ZeroCrossMonitor};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The control path holds the channel table; nothing was touched.
    Paused,
    /// The tick ran.
    Ran {
        crossing: Crossing,
        /// Channels whose transition fired on this tick.
        fired: usize,
    },
}

/// The unique real-time handle of one [`Dimmer`](super::Dimmer).
///
/// Created by `setup` and handed to the tick driver.  It is `Send` so a
/// driver can move it into a pinned task or an ISR argument, but it is not
/// `Clone`: exactly one context runs the tick path.
pub struct PhaseScheduler<G: GpioPort, C: ClockSource> {
    shared: Arc<Shared<G, C>>,
    monitor: ZeroCrossMonitor,
    tick_interval_us: Micros,
}

impl<G: GpioPort, C: ClockSource> PhaseScheduler<G, C> {
    pub(crate) fn new(shared: Arc<Shared<G, C>>, sync_pin: PinId, config: &DimmerConfig) -> Self {
        Self {
            shared,
            monitor: ZeroCrossMonitor::new(sync_pin, config),
            tick_interval_us: config.tick_interval_us,
        }
    }

    /// GPIO number of the zero-cross input.
    pub fn sync_pin(&self) -> PinId {
        self.monitor.pin()
    }

    /// Period at which a push-mode driver should call [`Self::on_timer_tick`].
    pub fn tick_interval_us(&self) -> Micros {
        self.tick_interval_us
    }

    /// Handle for the sync-edge ISR in push mode.
    pub fn edge_latch(&self) -> EdgeLatch<G, C> {
        EdgeLatch {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Pull strategy: sample the sync input and service all channels.
    pub fn poll(&mut self) -> Tick {
        let shared = &*self.shared;
        let now = shared.clock.now_us();
        let Some(mut guard) = shared.quiesce.enter() else {
            return Tick::Paused;
        };

        let crossing = if self.monitor.gate_open(&shared.sync, now) {
            let high = shared.gpio.read(self.monitor.pin());
            self.monitor.sample(&shared.sync, high, now)
        } else {
            Crossing::None
        };

        let table = shared.tick_table(&mut guard);
        advance(shared, &mut self.monitor, table, now, crossing)
    }

    /// Push strategy: consume the edge latched by the ISR, if any, and
    /// service all channels.
    pub fn on_timer_tick(&mut self) -> Tick {
        let shared = &*self.shared;
        let Some(mut guard) = shared.quiesce.enter() else {
            // A latched edge stays pending for the next tick.
            return Tick::Paused;
        };

        // Take the edge before reading the clock, so a latched timestamp
        // never lies ahead of `now`.  An edge latched after the take waits
        // for the next tick.
        let latched = shared.sync.take_latched_edge();
        let now = shared.clock.now_us();
        let crossing = match latched {
            Some(at) => self.monitor.edge(&shared.sync, at),
            None => Crossing::None,
        };

        let table = shared.tick_table(&mut guard);
        advance(shared, &mut self.monitor, table, now, crossing)
    }

    /// Poll until `stop` is raised.  Body of the pinned polling task.
    pub fn run_until(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            self.poll();
        }
    }
}

/// Crossing timestamp latch for the sync-edge ISR.
pub struct EdgeLatch<G: GpioPort, C: ClockSource> {
    shared: Arc<Shared<G, C>>,
}

impl<G: GpioPort, C: ClockSource> EdgeLatch<G, C> {
    /// Record a rising edge now.  ISR-safe: one clock read, two atomic stores.
    #[inline]
    pub fn on_edge(&self) {
        self.shared.sync.latch_edge(self.shared.clock.now_us());
    }
}

impl<G: GpioPort, C: ClockSource> Clone for EdgeLatch<G, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

// ── Algorithm ─────────────────────────────────────────────────────

fn advance<G: GpioPort, C: ClockSource>(
    shared: &Shared<G, C>,
    monitor: &mut ZeroCrossMonitor,
    table: &mut ChannelTable,
    now: Micros,
    crossing: Crossing,
) -> Tick {
    let crossing = match crossing {
        Crossing::Accepted { period_us } => {
            start_half_cycle(&shared.gpio, table, period_us);
            crossing
        }
        Crossing::None | Crossing::Rejected => match monitor.check_loss(&shared.sync, now) {
            Crossing::MainsLost => {
                hold_off(&shared.gpio, table);
                Crossing::MainsLost
            }
            _ => crossing,
        },
        Crossing::MainsLost => crossing,
    };

    let elapsed = elapsed_since(shared.sync.last_crossing(), now);
    let fired = fire_due(&shared.gpio, table, elapsed);
    Tick::Ran { crossing, fired }
}

/// Time from `crossing` to `now`, 0 when the crossing lies ahead of `now`.
///
/// Timestamps wrap, so "ahead" means less than half the range ahead.
pub(crate) fn elapsed_since(crossing: Micros, now: Micros) -> Micros {
    if crossing != now && crossing.wrapping_sub(now) < Micros::MAX / 2 {
        0
    } else {
        now.wrapping_sub(crossing)
    }
}

/// Re-arm every channel at an accepted crossing.
///
/// A known period rescales thresholds from the stored brightness first.
/// Channels that never switch this half-cycle (full share) or switch at the
/// crossing (zero share) are settled here and never armed.
pub(crate) fn start_half_cycle<G: GpioPort>(gpio: &G, table: &mut ChannelTable, period_us: Micros) {
    for ch in table.iter_mut() {
        if period_us != 0 {
            ch.rescale(period_us);
        }
        let (state, armed) = match ch.switch_promille() {
            FULL_SCALE => (ch.mode().start_state(), false),
            0 => (ch.mode().switched_state(), false),
            _ => (ch.mode().start_state(), true),
        };
        gpio.write(ch.pin(), state);
        ch.set_switched(!armed);
    }
}

/// Mains lost: load off on every output, nothing armed.
pub(crate) fn hold_off<G: GpioPort>(gpio: &G, table: &mut ChannelTable) {
    for ch in table.iter_mut() {
        gpio.write(ch.pin(), false);
        ch.set_switched(true);
    }
}

/// Fire every armed channel whose threshold lies behind `elapsed`.
///
/// A channel moved to full share mid-cycle stays armed but never fires:
/// its start state is the whole half-cycle, however late the next
/// crossing comes.
pub(crate) fn fire_due<G: GpioPort>(gpio: &G, table: &mut ChannelTable, elapsed: Micros) -> usize {
    let mut fired = 0;
    for ch in table
        .iter_mut()
        .filter(|c| !c.switched() && c.switch_promille() != FULL_SCALE)
    {
        if elapsed > ch.level_us() {
            gpio.write(ch.pin(), ch.mode().switched_state());
            ch.set_switched(true);
            fired += 1;
        }
    }
    fired
}
