//! [`GpioPort`] over raw ESP-IDF GPIO calls.
//!
//! Stateless: pins are addressed by number, exactly as the binding layer
//! names them.  On host targets the underlying helpers are simulation
//! no-ops.

use crate::app::ports::{GpioPort, PinId};
use crate::drivers::gpio;
use crate::error::HardwareFault;

#[derive(Debug, Default, Clone, Copy)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl GpioPort for EspGpio {
    fn configure_output(&self, pin: PinId) -> Result<(), HardwareFault> {
        gpio::configure_output(pin)
    }

    fn configure_sync_input(&self, pin: PinId) -> Result<(), HardwareFault> {
        gpio::configure_sync_input(pin)
    }

    #[inline]
    fn write(&self, pin: PinId, high: bool) {
        gpio::gpio_write(pin, high);
    }

    #[inline]
    fn read(&self, pin: PinId) -> bool {
        gpio::gpio_read(pin)
    }
}
