//! [`GpioPort`] over `embedded-hal` 1.0 pin objects.
//!
//! For boards whose HAL hands out typed pins instead of raw numbers.  The
//! application registers each pin object under the number the binding
//! layer will use; `configure_*` then only checks the registration, since
//! a typed pin is already configured by construction.
//!
//! The pins live in a [`critical_section::Mutex`] so the tick path and the
//! control path can share the bank through `&self`.  The tick path has
//! nowhere to report a failed write, so failures are only counted
//! ([`HalGpio::write_errors`]).

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{GpioPort, PinId};
use crate::dimmer::MAX_CHANNELS;
use crate::error::{DimmerError, HardwareFault, Result};

/// Return code reported for a pin number with no registered pin object.
const NOT_REGISTERED: i32 = -1;

pub struct HalGpio<O, I> {
    outputs: Mutex<RefCell<heapless::Vec<(PinId, O), MAX_CHANNELS>>>,
    sync: Mutex<RefCell<Option<(PinId, I)>>>,
    write_errors: AtomicU32,
}

impl<O, I> Default for HalGpio<O, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, I> HalGpio<O, I> {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(RefCell::new(heapless::Vec::new())),
            sync: Mutex::new(RefCell::new(None)),
            write_errors: AtomicU32::new(0),
        }
    }

    /// Output writes the HAL rejected since construction.
    pub fn write_errors(&self) -> u32 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Register an output pin object under `pin`.
    pub fn with_output(self, pin: PinId, output: O) -> Result<Self> {
        critical_section::with(|cs| {
            self.outputs
                .borrow_ref_mut(cs)
                .push((pin, output))
                .map_err(|_| DimmerError::TableFull)
        })?;
        Ok(self)
    }

    /// Register the zero-cross input pin object under `pin`.
    pub fn with_sync_input(self, pin: PinId, input: I) -> Self {
        critical_section::with(|cs| {
            self.sync.borrow_ref_mut(cs).replace((pin, input));
        });
        self
    }
}

impl<O, I> GpioPort for HalGpio<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    fn configure_output(&self, pin: PinId) -> core::result::Result<(), HardwareFault> {
        critical_section::with(|cs| {
            if self.outputs.borrow_ref(cs).iter().any(|(p, _)| *p == pin) {
                Ok(())
            } else {
                Err(HardwareFault::PinConfig {
                    pin,
                    code: NOT_REGISTERED,
                })
            }
        })
    }

    fn configure_sync_input(&self, pin: PinId) -> core::result::Result<(), HardwareFault> {
        critical_section::with(|cs| match &*self.sync.borrow_ref(cs) {
            Some((p, _)) if *p == pin => Ok(()),
            _ => Err(HardwareFault::PinConfig {
                pin,
                code: NOT_REGISTERED,
            }),
        })
    }

    fn write(&self, pin: PinId, high: bool) {
        critical_section::with(|cs| {
            let mut outputs = self.outputs.borrow_ref_mut(cs);
            if let Some((_, out)) = outputs.iter_mut().find(|(p, _)| *p == pin) {
                if out.set_state(high.into()).is_err() {
                    self.write_errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    }

    fn read(&self, pin: PinId) -> bool {
        critical_section::with(|cs| match &mut *self.sync.borrow_ref_mut(cs) {
            Some((p, input)) if *p == pin => input.is_high().unwrap_or(false),
            _ => false,
        })
    }
}
