//! Port traits: the boundary between the dimmer engine and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dimmer / PhaseScheduler (domain)
//! ```
//!
//! Driven adapters (clock, GPIO, tick source, event sinks) implement these
//! traits.  The engine consumes them via generics, so the real-time code
//! never touches ESP-IDF directly and runs unchanged against simulated pins
//! on the host.
//!
//! ## Real-time contract
//!
//! [`ClockSource::now_us`], [`GpioPort::write`] and [`GpioPort::read`] are
//! called from the tick path (ISR or pinned task).  Implementations must
//! not block, allocate or log.

use std::sync::Arc;

use crate::dimmer::PhaseScheduler;
use crate::error::{HardwareFault, Result};

/// GPIO number, as ESP-IDF numbers them.
pub type PinId = i32;

/// Wrapping microsecond timestamp.  Differences use `wrapping_sub`, so the
/// 71-minute wrap is invisible to anything shorter than that.
pub type Micros = u32;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic high-resolution time.
pub trait ClockSource: Send + Sync {
    /// Microseconds since an arbitrary epoch, truncated to 32 bits.
    fn now_us(&self) -> Micros;
}

impl<T: ClockSource + ?Sized> ClockSource for Arc<T> {
    fn now_us(&self) -> Micros {
        (**self).now_us()
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO port
// ───────────────────────────────────────────────────────────────

/// Digital pins addressed by number.
///
/// Methods take `&self`: the tick path and the control path share one
/// instance, and a GPIO register write is already atomic per pin.
pub trait GpioPort: Send + Sync {
    /// Configure `pin` as a push-pull output.  Control path only.
    fn configure_output(&self, pin: PinId) -> core::result::Result<(), HardwareFault>;

    /// Configure `pin` as the zero-cross input (pull-up enabled).  Control path only.
    fn configure_sync_input(&self, pin: PinId) -> core::result::Result<(), HardwareFault>;

    /// Drive an output.  `true` = HIGH = load energised.
    fn write(&self, pin: PinId, high: bool);

    /// Sample an input.
    fn read(&self, pin: PinId) -> bool;
}

impl<T: GpioPort + ?Sized> GpioPort for Arc<T> {
    fn configure_output(&self, pin: PinId) -> core::result::Result<(), HardwareFault> {
        (**self).configure_output(pin)
    }

    fn configure_sync_input(&self, pin: PinId) -> core::result::Result<(), HardwareFault> {
        (**self).configure_sync_input(pin)
    }

    fn write(&self, pin: PinId, high: bool) {
        (**self).write(pin, high);
    }

    fn read(&self, pin: PinId) -> bool {
        (**self).read(pin)
    }
}

// ───────────────────────────────────────────────────────────────
// Tick driver (push or pull realisation of the real-time loop)
// ───────────────────────────────────────────────────────────────

/// Starts the real-time path.
///
/// `setup` hands the freshly built [`PhaseScheduler`] to the driver, which
/// may call into it from any execution context (ISR, pinned task, foreign
/// thread).  Every tick enters through the pause handshake, so the driver
/// needs no extra bookkeeping.
///
/// On error the driver must drop the scheduler and leave no callbacks
/// registered: `setup` reports the failure with no state changed.
pub trait TickDriver<G: GpioPort, C: ClockSource> {
    fn start(&mut self, scheduler: PhaseScheduler<G, C>) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The supervisor emits [`DimmerEvent`](super::events::DimmerEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT,
/// the scripting layer's callback, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DimmerEvent);
}
