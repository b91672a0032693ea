//! Fuzz target: sync waveform → `PhaseScheduler::poll`
//!
//! Each input byte is one sync sample: bit 7 is the line level, the low
//! seven bits the microseconds since the previous sample.  A few control
//! operations are interleaved from the same stream.  Asserts that the
//! engine never panics, never writes an unconfigured pin, and never
//! reports a period outside the accepted band.
//!
//! cargo fuzz run fuzz_zero_cross

#![no_main]

use std::sync::Arc;

use acdimmer::adapters::sim::{SimClock, SimGpio};
use acdimmer::drivers::external::ExternalTick;
use acdimmer::{Dimmer, DimmerConfig, DimmerMode};
use libfuzzer_sys::fuzz_target;

const SYNC: i32 = 4;

fuzz_target!(|data: &[u8]| {
    let gpio = Arc::new(SimGpio::new());
    let clock = Arc::new(SimClock::new());
    let config = DimmerConfig::default();
    let (min_period, loss) = (config.min_half_period_us(), config.loss_timeout_us());

    let mut dimmer = Dimmer::new(Arc::clone(&gpio), Arc::clone(&clock));
    let mut tick = ExternalTick::new();
    if dimmer.setup(SYNC, config, &mut tick).is_err() {
        return;
    }
    let Some(mut scheduler) = tick.take() else {
        return;
    };
    let _ = dimmer.add(18, DimmerMode::LeadingEdge);
    let _ = dimmer.add(19, DimmerMode::TrailingEdge);

    for (i, &b) in data.iter().enumerate() {
        // Stretch the waveform so real half-cycles are reachable.
        clock.advance(u32::from(b & 0x7f) * 100);
        gpio.set_input(SYNC, b & 0x80 != 0);
        scheduler.poll();

        if i % 64 == 63 {
            let pin = 18 + (b as i32 & 1);
            let _ = dimmer.set_level(pin, i32::from(b) * 8 - 200);
        }

        let period = dimmer.sync_status().period_us;
        assert!(period == 0 || (min_period..=loss).contains(&period));
    }

    assert_eq!(gpio.stray_writes(), 0);
    let snap = dimmer.list_debug().expect("no tick path runs concurrently");
    assert!(snap.channels.len() <= 2);
});
