//! Unified error types for the dimmer engine.
//!
//! Every Control API call returns [`DimmerError`] synchronously.  The
//! real-time path never produces one: faults there (mains loss, noisy sync)
//! become state that `mains_frequency()` / `list_debug()` expose.
//! All variants are `Copy` so they can be returned from the control path
//! without allocation.

use core::fmt;

use crate::app::ports::PinId;

// ---------------------------------------------------------------------------
// Top-level dimmer error
// ---------------------------------------------------------------------------

/// Every fallible Control API operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimmerError {
    /// Out-of-range pin, unknown mode, inconsistent options, repeated setup.
    InvalidArgument(&'static str),
    /// `set_level` on a pin that is not in the channel table.
    UnconfiguredChannel(PinId),
    /// `remove` on a pin that is not in the channel table.
    UnknownChannel(PinId),
    /// A channel operation was issued before `setup`.
    NotInitialized,
    /// The fixed-capacity channel table has no free slot.
    TableFull,
    /// The platform layer failed to configure a pin, timer or task.
    HardwareFault(HardwareFault),
}

impl fmt::Display for DimmerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::UnconfiguredChannel(pin) => {
                write!(f, "cannot set dim level of unconfigured pin {pin}")
            }
            Self::UnknownChannel(pin) => write!(f, "pin {pin} is not dimmed"),
            Self::NotInitialized => write!(f, "dimmer not set up"),
            Self::TableFull => write!(f, "channel table full"),
            Self::HardwareFault(e) => write!(f, "hardware: {e}"),
        }
    }
}

impl std::error::Error for DimmerError {}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

/// Failures reported by GPIO / timer / task bring-up.
///
/// ESP-IDF return codes are carried verbatim; simulated platforms use `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareFault {
    /// Pin direction / pull configuration failed.
    PinConfig { pin: PinId, code: i32 },
    /// Tick timer creation, alarm setup or start failed.
    TimerConfig(i32),
    /// GPIO ISR service install or handler registration failed.
    IsrInstall(i32),
    /// The real-time task could not be spawned.
    TaskSpawn,
    /// The real-time path did not acknowledge a pause request in time.
    TickStalled,
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinConfig { pin, code } => {
                write!(f, "GPIO {pin} config failed (rc={code})")
            }
            Self::TimerConfig(rc) => write!(f, "tick timer config failed (rc={rc})"),
            Self::IsrInstall(rc) => write!(f, "GPIO ISR install failed (rc={rc})"),
            Self::TaskSpawn => write!(f, "real-time task spawn failed"),
            Self::TickStalled => write!(f, "real-time path did not acknowledge pause"),
        }
    }
}

impl From<HardwareFault> for DimmerError {
    fn from(e: HardwareFault) -> Self {
        Self::HardwareFault(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, DimmerError>;
