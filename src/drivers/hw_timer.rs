//! Push-mode tick driver: general-purpose timer alarm + sync-edge ISR.
//!
//! - A GPTimer at 1 MHz raises an auto-reloading alarm every
//!   `tick_interval_us`; its ISR calls [`PhaseScheduler::on_timer_tick`].
//! - A rising-edge interrupt on the sync pin calls [`EdgeLatch::on_edge`],
//!   which only latches a timestamp.
//!
//! Both callbacks run in interrupt context.  The scheduler and the latch
//! are boxed and handed to ESP-IDF as the callback arguments; they are
//! reclaimed on `stop` (or drop) after both interrupts are torn down.
//!
//! On host targets there is no timer and `start` fails with
//! [`HardwareFault::TimerConfig`].

use crate::app::ports::{ClockSource, GpioPort, TickDriver};
use crate::dimmer::PhaseScheduler;
#[cfg(target_os = "espidf")]
use crate::dimmer::EdgeLatch;
use crate::error::{HardwareFault, Result};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// GPTimer counting rate: one count per µs.
#[cfg(target_os = "espidf")]
const TIMER_RESOLUTION_HZ: u32 = 1_000_000;

#[cfg(target_os = "espidf")]
struct Running<G: GpioPort, C: ClockSource> {
    timer: gptimer_handle_t,
    sync_pin: i32,
    scheduler: *mut PhaseScheduler<G, C>,
    latch: *mut EdgeLatch<G, C>,
}

pub struct TimerTickDriver<G: GpioPort, C: ClockSource> {
    #[cfg(target_os = "espidf")]
    running: Option<Running<G, C>>,
    #[cfg(not(target_os = "espidf"))]
    _marker: core::marker::PhantomData<(G, C)>,
}

impl<G: GpioPort, C: ClockSource> Default for TimerTickDriver<G, C> {
    fn default() -> Self {
        Self::new()
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_alarm<G: GpioPort, C: ClockSource>(
    _timer: gptimer_handle_t,
    _edata: *const gptimer_alarm_event_data_t,
    arg: *mut core::ffi::c_void,
) -> bool {
    // SAFETY: `arg` is the boxed scheduler registered in `start`; only this
    // ISR dereferences it until `stop` has deleted the timer.
    let scheduler = unsafe { &mut *arg.cast::<PhaseScheduler<G, C>>() };
    scheduler.on_timer_tick();
    false
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_sync_edge<G: GpioPort, C: ClockSource>(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the boxed latch registered in `start`, alive until
    // `stop` has removed the handler.
    let latch = unsafe { &*arg.cast::<EdgeLatch<G, C>>() };
    latch.on_edge();
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, fault: fn(i32) -> HardwareFault) -> core::result::Result<(), HardwareFault> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(fault(ret)) }
}

#[cfg(target_os = "espidf")]
impl<G: GpioPort, C: ClockSource> TimerTickDriver<G, C> {
    pub fn new() -> Self {
        Self { running: None }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Tear down both interrupts and release the scheduler.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        // SAFETY: handles were created in `start`; after the timer is
        // deleted and the GPIO handler removed no ISR can touch the boxes.
        unsafe {
            teardown(&running);
        }
        info!("TimerTickDriver: stopped");
    }
}

/// Undo whatever `start` managed to set up.  Null handles are skipped.
#[cfg(target_os = "espidf")]
unsafe fn teardown<G: GpioPort, C: ClockSource>(running: &Running<G, C>) {
    unsafe {
        if !running.timer.is_null() {
            gptimer_stop(running.timer);
            gptimer_disable(running.timer);
            gptimer_del_timer(running.timer);
        }
        gpio_set_intr_type(running.sync_pin, gpio_int_type_t_GPIO_INTR_DISABLE);
        gpio_isr_handler_remove(running.sync_pin);
        drop(Box::from_raw(running.scheduler));
        drop(Box::from_raw(running.latch));
    }
}

#[cfg(target_os = "espidf")]
impl<G: GpioPort, C: ClockSource> Drop for TimerTickDriver<G, C> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(target_os = "espidf")]
impl<G, C> TickDriver<G, C> for TimerTickDriver<G, C>
where
    G: GpioPort + 'static,
    C: ClockSource + 'static,
{
    fn start(&mut self, scheduler: PhaseScheduler<G, C>) -> Result<()> {
        if self.running.is_some() {
            return Err(crate::error::DimmerError::InvalidArgument("tick timer already running"));
        }
        super::gpio::install_isr_service()?;

        let sync_pin = scheduler.sync_pin();
        let interval = u64::from(scheduler.tick_interval_us());
        let mut running = Running {
            timer: core::ptr::null_mut(),
            sync_pin,
            latch: Box::into_raw(Box::new(scheduler.edge_latch())),
            scheduler: Box::into_raw(Box::new(scheduler)),
        };

        // SAFETY: control-path bring-up; the boxes outlive both ISRs
        // because `teardown` runs before they are freed.
        let result = unsafe { arm(&mut running, interval) };
        match result {
            Ok(()) => {
                info!(
                    "TimerTickDriver: tick every {} us, sync edge ISR on GPIO {}",
                    interval, sync_pin
                );
                self.running = Some(running);
                Ok(())
            }
            Err(e) => {
                warn!("TimerTickDriver: {}", e);
                unsafe { teardown(&running) };
                Err(e.into())
            }
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe fn arm<G: GpioPort, C: ClockSource>(
    running: &mut Running<G, C>,
    interval_us: u64,
) -> core::result::Result<(), HardwareFault> {
    unsafe {
        check(
            gpio_set_intr_type(running.sync_pin, gpio_int_type_t_GPIO_INTR_POSEDGE),
            HardwareFault::IsrInstall,
        )?;
        check(
            gpio_isr_handler_add(running.sync_pin, Some(on_sync_edge::<G, C>), running.latch.cast()),
            HardwareFault::IsrInstall,
        )?;

        let timer_cfg = gptimer_config_t {
            clk_src: soc_periph_gptimer_clk_src_t_GPTIMER_CLK_SRC_DEFAULT,
            direction: gptimer_count_direction_t_GPTIMER_COUNT_UP,
            resolution_hz: TIMER_RESOLUTION_HZ,
            ..Default::default()
        };
        check(gptimer_new_timer(&timer_cfg, &mut running.timer), HardwareFault::TimerConfig)?;

        let callbacks = gptimer_event_callbacks_t {
            on_alarm: Some(on_alarm::<G, C>),
        };
        check(
            gptimer_register_event_callbacks(running.timer, &callbacks, running.scheduler.cast()),
            HardwareFault::TimerConfig,
        )?;

        let mut alarm = gptimer_alarm_config_t {
            alarm_count: interval_us,
            reload_count: 0,
            ..Default::default()
        };
        alarm.flags.set_auto_reload_on_alarm(1);
        check(gptimer_set_alarm_action(running.timer, &alarm), HardwareFault::TimerConfig)?;
        check(gptimer_enable(running.timer), HardwareFault::TimerConfig)?;
        check(gptimer_start(running.timer), HardwareFault::TimerConfig)?;
    }
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl<G: GpioPort, C: ClockSource> TimerTickDriver<G, C> {
    pub fn new() -> Self {
        Self {
            _marker: core::marker::PhantomData,
        }
    }

    pub fn is_running(&self) -> bool {
        false
    }

    pub fn stop(&mut self) {}
}

#[cfg(not(target_os = "espidf"))]
impl<G: GpioPort, C: ClockSource> TickDriver<G, C> for TimerTickDriver<G, C> {
    fn start(&mut self, _scheduler: PhaseScheduler<G, C>) -> Result<()> {
        log::warn!("TimerTickDriver(sim): no hardware timer on this target");
        Err(HardwareFault::TimerConfig(-1).into())
    }
}
