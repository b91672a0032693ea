//! Zero-cross detection and the shared sync state.
//!
//! ## Hardware
//!
//! An optocoupler pulls the sync input high around every mains zero
//! crossing, so a rising edge marks the start of a half-cycle.  Real
//! optocouplers ring, and cheap ones produce several edges per crossing.
//!
//! ## Split
//!
//! [`SyncState`] is a block of atomics shared by the tick path (writer) and
//! the control path (reader).  [`ZeroCrossMonitor`] is the writer's private
//! state machine (previous sample, debounce bookkeeping) and lives inside
//! the [`PhaseScheduler`](super::PhaseScheduler), so it needs no
//! synchronisation at all.
//!
//! In push mode the edge ISR does nothing but latch a timestamp into
//! [`SyncState`]; the next timer tick consumes it.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::Serialize;

use crate::app::ports::{Micros, PinId};
use crate::config::DimmerConfig;

/// Outcome of one monitor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Nothing happened.
    None,
    /// A crossing was accepted; `period_us` is 0 for the first one after
    /// start-up or a mains loss.
    Accepted { period_us: Micros },
    /// An edge arrived too early and was counted as noise.
    Rejected,
    /// The loss timeout expired with no crossing.
    MainsLost,
}

/// Point-in-time view of the sync counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncStatus {
    /// Length of the last half-cycle in µs, 0 while mains is undetected.
    pub period_us: Micros,
    /// Timestamp of the last accepted crossing.
    pub last_crossing_us: Micros,
    /// Debounce gate currently in force, 0 when off.
    pub resync_target_us: Micros,
    /// Accepted crossings since setup.
    pub crossings: u32,
    /// Raw rising edges seen on the sync input since setup.
    pub edges: u32,
    /// Edges discarded as noise since setup.
    pub rejected: u32,
    /// Mains-loss declarations since setup.
    pub dropouts: u32,
}

impl SyncStatus {
    /// Mains frequency in Hz derived from the half-cycle, 0 when unknown.
    pub fn mains_frequency(&self) -> f32 {
        if self.period_us == 0 {
            0.0
        } else {
            500_000.0 / self.period_us as f32
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared state (atomics)
// ───────────────────────────────────────────────────────────────

/// Sync state published by the tick path.
#[derive(Debug, Default)]
pub struct SyncState {
    last_crossing: AtomicU32,
    period: AtomicU32,
    resync_target: AtomicU32,
    crossings: AtomicU32,
    edges: AtomicU32,
    rejected: AtomicU32,
    dropouts: AtomicU32,

    /// Timestamp latched by the edge ISR (push mode).
    latched_edge: AtomicU32,
    /// `latched_edge` holds an edge not yet consumed by a tick.
    edge_pending: AtomicBool,
}

impl SyncState {
    pub const fn new() -> Self {
        Self {
            last_crossing: AtomicU32::new(0),
            period: AtomicU32::new(0),
            resync_target: AtomicU32::new(0),
            crossings: AtomicU32::new(0),
            edges: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
            dropouts: AtomicU32::new(0),
            latched_edge: AtomicU32::new(0),
            edge_pending: AtomicBool::new(false),
        }
    }

    /// Forget everything and start the loss timer at `now`.  Setup only.
    pub fn reset(&self, now: Micros) {
        self.last_crossing.store(now, Ordering::Relaxed);
        self.period.store(0, Ordering::Relaxed);
        self.resync_target.store(0, Ordering::Relaxed);
        self.crossings.store(0, Ordering::Relaxed);
        self.edges.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.dropouts.store(0, Ordering::Relaxed);
        self.edge_pending.store(false, Ordering::Release);
    }

    pub fn last_crossing(&self) -> Micros {
        self.last_crossing.load(Ordering::Acquire)
    }

    pub fn period(&self) -> Micros {
        self.period.load(Ordering::Acquire)
    }

    pub fn resync_target(&self) -> Micros {
        self.resync_target.load(Ordering::Acquire)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            period_us: self.period(),
            last_crossing_us: self.last_crossing(),
            resync_target_us: self.resync_target(),
            crossings: self.crossings.load(Ordering::Relaxed),
            edges: self.edges.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dropouts: self.dropouts.load(Ordering::Relaxed),
        }
    }

    // ── Edge latch (ISR → tick) ───────────────────────────────────

    /// Record a rising edge at `at`.  Safe from interrupt context.
    ///
    /// A second edge before the tick consumes the first overwrites it;
    /// the monitor would have rejected it as noise anyway.
    #[inline]
    pub fn latch_edge(&self, at: Micros) {
        self.latched_edge.store(at, Ordering::Relaxed);
        self.edge_pending.store(true, Ordering::Release);
    }

    /// Consume the latched edge, if any.
    #[inline]
    pub fn take_latched_edge(&self) -> Option<Micros> {
        if self.edge_pending.swap(false, Ordering::Acquire) {
            Some(self.latched_edge.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    // ── Writer side (tick path only) ─────────────────────────────

    fn publish_crossing(&self, at: Micros, period: Micros, resync_target: Micros) {
        self.period.store(period, Ordering::Relaxed);
        self.resync_target.store(resync_target, Ordering::Relaxed);
        self.last_crossing.store(at, Ordering::Release);
        self.crossings.fetch_add(1, Ordering::Relaxed);
    }

    fn declare_loss(&self) {
        self.period.store(0, Ordering::Release);
        self.resync_target.store(0, Ordering::Release);
        self.dropouts.fetch_add(1, Ordering::Relaxed);
    }
}

// ───────────────────────────────────────────────────────────────
// Monitor (tick-path private)
// ───────────────────────────────────────────────────────────────

/// Debounce, period measurement and loss detection for one sync input.
#[derive(Debug, Clone)]
pub struct ZeroCrossMonitor {
    pin: PinId,
    min_period_us: Micros,
    loss_timeout_us: Micros,
    /// Source of the debounce gate fraction.
    config: DimmerConfig,
    /// Sync level at the previous poll.
    prev_sample: bool,
    /// At least one crossing accepted since start-up or the last loss.
    synced: bool,
}

impl ZeroCrossMonitor {
    pub fn new(pin: PinId, config: &DimmerConfig) -> Self {
        Self {
            pin,
            min_period_us: config.min_half_period_us(),
            loss_timeout_us: config.loss_timeout_us(),
            config: config.clone(),
            // Assume high so a line that idles high does not fake an edge.
            prev_sample: true,
            synced: false,
        }
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Whether the sync input is worth sampling at `now`.
    ///
    /// Inside the debounce gate any edge would be rejected, so the poller
    /// skips the GPIO read entirely.
    #[inline]
    pub fn gate_open(&self, sync: &SyncState, now: Micros) -> bool {
        let target = sync.resync_target();
        target == 0 || now.wrapping_sub(sync.last_crossing()) >= target
    }

    /// Feed one sample of the sync input (pull mode).
    #[inline]
    pub fn sample(&mut self, sync: &SyncState, high: bool, now: Micros) -> Crossing {
        let rising = high && !self.prev_sample;
        self.prev_sample = high;
        if rising {
            self.edge(sync, now)
        } else {
            Crossing::None
        }
    }

    /// Classify a rising edge seen at `at`.
    pub fn edge(&mut self, sync: &SyncState, at: Micros) -> Crossing {
        sync.edges.fetch_add(1, Ordering::Relaxed);

        let elapsed = at.wrapping_sub(sync.last_crossing());
        let target = sync.resync_target();
        if self.synced && ((target != 0 && elapsed < target) || elapsed < self.min_period_us) {
            sync.rejected.fetch_add(1, Ordering::Relaxed);
            return Crossing::Rejected;
        }

        let period = if self.synced && elapsed <= self.loss_timeout_us {
            elapsed
        } else {
            0
        };
        let resync_target = self.config.resync_target_us(period);
        sync.publish_crossing(at, period, resync_target);
        self.synced = true;
        Crossing::Accepted { period_us: period }
    }

    /// Declare mains lost once `loss_timeout_us` passes without a crossing.
    ///
    /// Fires once per outage; the next accepted edge starts a fresh
    /// measurement.
    #[inline]
    pub fn check_loss(&mut self, sync: &SyncState, now: Micros) -> Crossing {
        if self.synced && now.wrapping_sub(sync.last_crossing()) > self.loss_timeout_us {
            self.synced = false;
            sync.declare_loss();
            Crossing::MainsLost
        } else {
            Crossing::None
        }
    }
}
