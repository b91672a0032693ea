//! Reference dimmer firmware: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │   Core 1 (ISR)                        Core 0 (main task)       │
//! │                                                                │
//! │   GPTimer alarm ─▶ PhaseScheduler     Dimmer (Control API)     │
//! │   sync edge ISR ─▶ EdgeLatch          MainsSupervisor          │
//! │                                        └─▶ LogEventSink        │
//! │                                                                │
//! │   ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                                │
//! │   EspGpio (GpioPort)            MonotonicClock (ClockSource)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sets up a leading-edge lamp and a trailing-edge LED driver, then ramps
//! both up and down forever while reporting mains health once a second.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use acdimmer::adapters::esp_gpio::EspGpio;
use acdimmer::adapters::log_sink::LogEventSink;
use acdimmer::adapters::time::MonotonicClock;
use acdimmer::drivers::hw_timer::TimerTickDriver;
use acdimmer::drivers::poller::PollingDriver;
use acdimmer::pins;
use acdimmer::supervisor::MainsSupervisor;
use acdimmer::{Dimmer, DimmerConfig, DimmerMode};

/// Ramp step per loop iteration (promille).
const RAMP_STEP: i32 = 25;
/// Main loop period.
const LOOP_PERIOD: Duration = Duration::from_millis(50);
/// Loop iterations between supervisor polls (1 s).
const SUPERVISE_EVERY: u32 = 20;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AC Dimmer v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Engine + tick path ─────────────────────────────────
    let config = DimmerConfig::default();
    let mut dimmer = Dimmer::new(EspGpio::new(), MonotonicClock::new());

    // Timer ISR first; fall back to a pinned polling task.
    let mut timer = TimerTickDriver::new();
    let mut poller = PollingDriver::new();
    if let Err(e) = dimmer.setup(pins::ZERO_CROSS_GPIO, config.clone(), &mut timer) {
        warn!("Timer tick unavailable ({}), polling on core 1 instead", e);
        dimmer.setup(pins::ZERO_CROSS_GPIO, config, &mut poller)?;
    }

    // ── 3. Channels ───────────────────────────────────────────
    dimmer.add(pins::LAMP_GPIO, DimmerMode::LeadingEdge)?;
    dimmer.add(pins::LED_DRIVER_GPIO, DimmerMode::TrailingEdge)?;

    // ── 4. Main loop ──────────────────────────────────────────
    let mut supervisor = MainsSupervisor::default();
    let mut sink = LogEventSink::new();
    let mut level: i32 = 0;
    let mut step = RAMP_STEP;
    let mut iteration: u32 = 0;

    loop {
        level += step;
        if !(0..=1000).contains(&level) {
            step = -step;
            level = level.clamp(0, 1000);
        }
        dimmer.set_level(pins::LAMP_GPIO, level)?;
        dimmer.set_level(pins::LED_DRIVER_GPIO, 1000 - level)?;

        iteration = iteration.wrapping_add(1);
        if iteration % SUPERVISE_EVERY == 0 {
            supervisor.evaluate(&dimmer.sync_status(), &mut sink);
            if iteration % (SUPERVISE_EVERY * 10) == 0 {
                let snapshot = dimmer.list_debug()?;
                info!("{:.2} Hz, {} channels", snapshot.mains_frequency_hz, snapshot.channels.len());
            }
        }

        std::thread::sleep(LOOP_PERIOD);
    }
}
