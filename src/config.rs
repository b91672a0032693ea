//! Dimmer configuration parameters
//!
//! The `options` argument of `setup`.  Nothing here is persisted: the
//! binding layer hands the options over (optionally as JSON) each boot.

use serde::{Deserialize, Serialize};

use crate::app::ports::{Micros, PinId};
use crate::error::{DimmerError, Result};
use crate::pins;

/// Microseconds in half a second: half-cycle period = this / mains Hz.
const HALF_SECOND_US: u32 = 500_000;

/// Highest pin number a 64-bit GPIO mask can address.
const MAX_MASK_PIN: PinId = 63;

/// Timing and limits for one dimmer controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimmerConfig {
    // --- Mains ---
    /// Expected mains frequency (Hz); basis for levels until a period is measured.
    pub nominal_mains_hz: u16,
    /// Lowest accepted mains frequency (Hz); sets the mains-loss timeout.
    pub min_mains_hz: u16,
    /// Highest accepted mains frequency (Hz); shorter half-cycles are noise.
    pub max_mains_hz: u16,

    // --- Synchronisation ---
    /// Debounce gate as a percentage of the last measured half-cycle.
    pub resync_percent: u8,
    /// Mains-loss timeout as a percentage of the half-cycle at `min_mains_hz`.
    pub loss_timeout_percent: u16,

    // --- Timing ---
    /// Hardware tick interval for the timer-driven scheduler (µs).
    pub tick_interval_us: u32,
    /// Upper bound on the control path's spin while waiting for a pause ack (µs).
    pub quiesce_timeout_us: u32,

    // --- Pins ---
    /// Highest GPIO number accepted for sync and output pins.
    pub max_gpio: PinId,
}

impl Default for DimmerConfig {
    fn default() -> Self {
        Self {
            // Mains
            nominal_mains_hz: 50,
            min_mains_hz: 45,
            max_mains_hz: 100,

            // Synchronisation
            resync_percent: 90,
            loss_timeout_percent: 110,

            // Timing
            tick_interval_us: 10,       // 1000 brightness steps per 50 Hz half-cycle
            quiesce_timeout_us: 100_000, // 10 half-cycles

            // Pins
            max_gpio: pins::MAX_GPIO,
        }
    }
}

impl DimmerConfig {
    /// Parse options from the binding layer.  Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|_| DimmerError::InvalidArgument("malformed dimmer options"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent values instead of silently clamping them.
    pub fn validate(&self) -> Result<()> {
        if self.min_mains_hz == 0
            || self.min_mains_hz > self.nominal_mains_hz
            || self.nominal_mains_hz > self.max_mains_hz
        {
            return Err(DimmerError::InvalidArgument(
                "mains band must satisfy 0 < min <= nominal <= max",
            ));
        }
        if self.max_mains_hz > 1000 {
            return Err(DimmerError::InvalidArgument("max_mains_hz above 1 kHz"));
        }
        if !(50..=99).contains(&self.resync_percent) {
            return Err(DimmerError::InvalidArgument("resync_percent outside 50..=99"));
        }
        if !(101..=300).contains(&self.loss_timeout_percent) {
            return Err(DimmerError::InvalidArgument(
                "loss_timeout_percent outside 101..=300",
            ));
        }
        if self.tick_interval_us == 0 || self.tick_interval_us > 1000 {
            return Err(DimmerError::InvalidArgument("tick_interval_us outside 1..=1000"));
        }
        if self.quiesce_timeout_us < self.tick_interval_us {
            return Err(DimmerError::InvalidArgument(
                "quiesce_timeout_us shorter than one tick",
            ));
        }
        if !(0..=MAX_MASK_PIN).contains(&self.max_gpio) {
            return Err(DimmerError::InvalidArgument("max_gpio outside 0..=63"));
        }
        Ok(())
    }

    /// Check that `pin` is a GPIO number this board has.
    pub fn check_pin(&self, pin: PinId) -> Result<()> {
        if (0..=self.max_gpio).contains(&pin) {
            Ok(())
        } else {
            Err(DimmerError::InvalidArgument("pin out of range"))
        }
    }

    // ── Derived timing ────────────────────────────────────────────

    /// Half-cycle at the nominal frequency.
    pub fn nominal_half_period_us(&self) -> Micros {
        HALF_SECOND_US / u32::from(self.nominal_mains_hz)
    }

    /// Shortest half-cycle accepted as a real crossing.
    pub fn min_half_period_us(&self) -> Micros {
        HALF_SECOND_US / u32::from(self.max_mains_hz)
    }

    /// Time without an accepted crossing after which mains is declared lost.
    pub fn loss_timeout_us(&self) -> Micros {
        let slowest = HALF_SECOND_US / u32::from(self.min_mains_hz);
        (u64::from(slowest) * u64::from(self.loss_timeout_percent) / 100) as Micros
    }

    /// Debounce gate derived from a measured half-cycle (0 = gate off).
    pub fn resync_target_us(&self, period_us: Micros) -> Micros {
        (u64::from(period_us) * u64::from(self.resync_percent) / 100) as Micros
    }
}
