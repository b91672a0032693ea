//! Tick driver that hands the scheduler back to the application.
//!
//! For applications with their own real-time loop, and for tests that step
//! the engine by hand.  Whoever takes the scheduler calls
//! [`PhaseScheduler::poll`] or [`PhaseScheduler::on_timer_tick`] at the
//! tick rate, from any one context.

use crate::app::ports::{ClockSource, GpioPort, TickDriver};
use crate::dimmer::PhaseScheduler;
use crate::error::{DimmerError, Result};

pub struct ExternalTick<G: GpioPort, C: ClockSource> {
    scheduler: Option<PhaseScheduler<G, C>>,
}

impl<G: GpioPort, C: ClockSource> Default for ExternalTick<G, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GpioPort, C: ClockSource> ExternalTick<G, C> {
    pub fn new() -> Self {
        Self { scheduler: None }
    }

    /// The scheduler handed over by `setup`, once.
    pub fn take(&mut self) -> Option<PhaseScheduler<G, C>> {
        self.scheduler.take()
    }
}

impl<G: GpioPort, C: ClockSource> TickDriver<G, C> for ExternalTick<G, C> {
    fn start(&mut self, scheduler: PhaseScheduler<G, C>) -> Result<()> {
        if self.scheduler.is_some() {
            return Err(DimmerError::InvalidArgument("scheduler not yet taken"));
        }
        self.scheduler = Some(scheduler);
        Ok(())
    }
}
