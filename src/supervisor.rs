//! Mains-health supervisor.
//!
//! Runs on the control path (e.g. once a second from the main loop) and
//! turns the sync counters into [`DimmerEvent`]s.  The tick path already
//! holds outputs off during an outage; the supervisor only reports.
//!
//! ## Event lifecycle
//!
//! 1. A measured period appears: `MainsRestored` (also on the first
//!    detection after boot).
//! 2. The period drops to 0, or the dropout counter moved since the last
//!    poll: `MainsLost`.  A short outage that started and ended between two
//!    polls yields `MainsLost` followed by `MainsRestored`.
//! 3. At least `noise_threshold` edges rejected since the last poll while
//!    previously quiet: `SyncNoise`.  Quiet again re-arms it.
//!
//! Events fire on transitions only; a steady state is silent.

use log::{error, info, warn};

use crate::app::events::DimmerEvent;
use crate::app::ports::EventSink;
use crate::dimmer::SyncStatus;

/// Rejected edges per poll that count as a noisy sync line by default.
const DEFAULT_NOISE_THRESHOLD: u32 = 10;

pub struct MainsSupervisor {
    noise_threshold: u32,
    mains_up: bool,
    noisy: bool,
    last_rejected: u32,
    last_dropouts: u32,
}

impl Default for MainsSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_THRESHOLD)
    }
}

impl MainsSupervisor {
    pub fn new(noise_threshold: u32) -> Self {
        Self {
            noise_threshold: noise_threshold.max(1),
            mains_up: false,
            noisy: false,
            last_rejected: 0,
            last_dropouts: 0,
        }
    }

    /// Compare `status` with the previous poll and emit what changed.
    pub fn evaluate<S: EventSink>(&mut self, status: &SyncStatus, sink: &mut S) {
        // ── Mains presence ────────────────────────────────────────
        let dropped = status.dropouts.wrapping_sub(self.last_dropouts) != 0;
        self.last_dropouts = status.dropouts;
        let up = status.period_us != 0;

        if self.mains_up && (dropped || !up) {
            error!("MAINS LOST ({} dropouts so far)", status.dropouts);
            self.mains_up = false;
            sink.emit(&DimmerEvent::MainsLost);
        }
        if up && !self.mains_up {
            let frequency_hz = status.mains_frequency();
            info!("MAINS DETECTED: {:.2} Hz", frequency_hz);
            self.mains_up = true;
            sink.emit(&DimmerEvent::MainsRestored { frequency_hz });
        }

        // ── Sync noise ────────────────────────────────────────────
        let rejected = status.rejected.wrapping_sub(self.last_rejected);
        self.last_rejected = status.rejected;
        if rejected >= self.noise_threshold {
            if !self.noisy {
                warn!("SYNC NOISE: {} edges rejected since last poll", rejected);
                self.noisy = true;
                sink.emit(&DimmerEvent::SyncNoise { rejected });
            }
        } else if self.noisy {
            info!("SYNC NOISE CLEARED");
            self.noisy = false;
        }
    }

    pub fn is_mains_up(&self) -> bool {
        self.mains_up
    }

    pub fn is_noisy(&self) -> bool {
        self.noisy
    }
}
