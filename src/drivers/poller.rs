//! Pull-mode tick driver: a pinned task that polls the scheduler forever.
//!
//! The task never sleeps.  On ESP32 it owns core 1, so the idle-task
//! watchdog for that core (`CONFIG_ESP_TASK_WDT_CHECK_IDLE_TASK_CPU1`)
//! must be off.  Resolution is one loop iteration, typically well under
//! a microsecond.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{info, warn};

use crate::app::ports::{ClockSource, GpioPort, TickDriver};
use crate::dimmer::PhaseScheduler;
use crate::error::{DimmerError, HardwareFault, Result};

use super::task_pin::{Core, spawn_on_core};

const TASK_NAME: &str = "dimmer-rt\0";

pub struct PollingDriver {
    core: Core,
    priority: u8,
    stack_kb: usize,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Default for PollingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PollingDriver {
    /// Core 1, priority 20, 4 KB stack.
    pub fn new() -> Self {
        Self {
            core: Core::App,
            priority: 20,
            stack_kb: 4,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn with_core(mut self, core: Core, priority: u8) -> Self {
        self.core = core;
        self.priority = priority;
        self
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the polling task and wait for it to exit.  Outputs keep their
    /// last state.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Relaxed);
        if handle.join().is_err() {
            warn!("PollingDriver: task panicked");
        } else {
            info!("PollingDriver: stopped");
        }
    }
}

impl Drop for PollingDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<G, C> TickDriver<G, C> for PollingDriver
where
    G: GpioPort + 'static,
    C: ClockSource + 'static,
{
    fn start(&mut self, mut scheduler: PhaseScheduler<G, C>) -> Result<()> {
        if self.handle.is_some() {
            return Err(DimmerError::InvalidArgument("polling driver already running"));
        }
        self.stop.store(false, Ordering::Relaxed);
        let stop = Arc::clone(&self.stop);

        let handle = spawn_on_core(self.core, self.priority, self.stack_kb, TASK_NAME, move || {
            scheduler.run_until(&stop);
        })
        .map_err(|e| {
            warn!("PollingDriver: spawn failed: {}", e);
            HardwareFault::TaskSpawn
        })?;

        self.handle = Some(handle);
        Ok(())
    }
}
