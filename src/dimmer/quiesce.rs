//! Pause/acknowledge handshake between the control path and the tick path.
//!
//! ```text
//!   control path                         tick path (ISR / pinned task)
//!   ────────────                         ─────────────────────────────
//!   request ← true ─────────────────▶    in_tick ← true
//!   spin while in_tick ◀─────────────    request set? in_tick ← false, skip
//!   mutate channel table                 ...otherwise run, then in_tick ← false
//!   request ← false ────────────────▶    next tick runs normally
//! ```
//!
//! Both sides store their own flag and then load the other's with `SeqCst`,
//! so at least one of them sees the other: either the tick backs off before
//! touching the table, or the control path waits for the tick to leave.
//! Clearing `in_tick` is the acknowledgement.
//!
//! ## Bounded spin
//!
//! A tick finishes in a few µs, so the control path spins for at most
//! `timeout_us` on the dimmer's clock.  Running out of time means the tick
//! path is wedged inside a tick; the caller gets
//! [`HardwareFault::TickStalled`] and the request is withdrawn.
//!
//! A tick source that is stopped (or has not started) is never inside a
//! tick, so pausing it succeeds at once.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::{ClockSource, Micros};
use crate::error::{HardwareFault, Result};

/// Request flag (control → tick) and in-tick flag (tick → control).
#[derive(Debug, Default)]
pub struct Quiescence {
    request: AtomicBool,
    in_tick: AtomicBool,
}

impl Quiescence {
    pub const fn new() -> Self {
        Self {
            request: AtomicBool::new(false),
            in_tick: AtomicBool::new(false),
        }
    }

    /// Tick-path entry.  `None` while a pause is requested; the caller must
    /// then leave shared state alone until the next tick.
    #[inline]
    pub fn enter(&self) -> Option<TickGuard<'_>> {
        self.in_tick.store(true, Ordering::SeqCst);
        if self.request.load(Ordering::SeqCst) {
            self.in_tick.store(false, Ordering::Release);
            None
        } else {
            Some(TickGuard { quiescence: self })
        }
    }

    /// Pause the tick path and return a guard that resumes it on drop.
    ///
    /// Only one control-path owner may call this at a time; the
    /// [`Dimmer`](super::Dimmer) enforces it with `&mut self` methods.
    pub fn pause<C: ClockSource>(&self, clock: &C, timeout_us: Micros) -> Result<PauseGuard<'_>> {
        self.request.store(true, Ordering::SeqCst);

        let started = clock.now_us();
        while self.in_tick.load(Ordering::SeqCst) {
            if clock.now_us().wrapping_sub(started) > timeout_us {
                self.request.store(false, Ordering::Release);
                return Err(HardwareFault::TickStalled.into());
            }
            core::hint::spin_loop();
        }
        Ok(PauseGuard { quiescence: self })
    }
}

/// Held by the tick path for the duration of one tick.
pub struct TickGuard<'a> {
    quiescence: &'a Quiescence,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.quiescence.in_tick.store(false, Ordering::Release);
    }
}

/// Held by the control path while the tick path is parked.
#[must_use = "the tick path resumes as soon as the guard is dropped"]
pub struct PauseGuard<'a> {
    quiescence: &'a Quiescence,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.quiescence.request.store(false, Ordering::Release);
    }
}
