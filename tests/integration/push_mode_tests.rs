//! Push strategy: edge ISR latches, timer tick consumes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use acdimmer::adapters::sim::SimGpio;
use acdimmer::app::ports::{ClockSource, Micros};
use acdimmer::dimmer::{Crossing, Tick};
use acdimmer::drivers::external::ExternalTick;
use acdimmer::{Dimmer, DimmerConfig, DimmerMode};

use crate::mock_hw::{Rig, SYNC};

/// Timer ticks every 10 µs up to `until`; an edge is latched at each
/// time in `edges` (ISR fires between ticks).
fn drive(rig: &mut Rig, until: Micros, edges: &[Micros]) {
    let latch = rig.scheduler.edge_latch();
    let mut pending = edges.iter().copied().peekable();
    while rig.clock.now_us() < until {
        let next = rig.clock.now_us() + 10;
        if let Some(&edge) = pending.peek() {
            if edge <= next {
                rig.clock.set(edge);
                latch.on_edge();
                pending.next();
            }
        }
        rig.clock.set(next);
        rig.scheduler.on_timer_tick();
    }
}

#[test]
fn latched_edges_drive_the_same_timing() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();

    drive(&mut rig, 29_000, &[1_000, 11_000, 21_000]);

    let status = rig.dimmer.sync_status();
    assert_eq!(status.crossings, 3);
    assert_eq!(status.period_us, 10_000);
    assert_eq!(status.last_crossing_us, 21_000);

    // Crossing consumed by the tick at 21 000; switch at the first tick
    // past 26 000.
    assert!(rig.gpio.level_at(18, 21_000));
    assert!(rig.gpio.level_at(18, 26_000));
    assert!(!rig.gpio.level_at(18, 26_010));
}

#[test]
fn ringing_edges_are_rejected_in_push_mode() {
    let mut rig = Rig::new();
    drive(&mut rig, 12_000, &[1_000, 1_200, 11_000]);
    let status = rig.dimmer.sync_status();
    assert_eq!(status.crossings, 2);
    assert_eq!(status.rejected, 1);
    assert_eq!(status.period_us, 10_000);
}

#[test]
fn latched_edge_is_consumed_by_one_tick() {
    let mut rig = Rig::new();
    let latch = rig.scheduler.edge_latch();
    rig.clock.set(1_000);
    latch.on_edge();

    let tick = rig.scheduler.on_timer_tick();
    assert_eq!(
        tick,
        Tick::Ran {
            crossing: Crossing::Accepted { period_us: 0 },
            fired: 0
        }
    );
    assert_eq!(rig.scheduler.on_timer_tick(), Tick::Ran { crossing: Crossing::None, fired: 0 });
}

// ── Edge latched between two clock reads ──────────────────────

/// Clock whose next read runs a one-shot hook after sampling the time,
/// the way an edge ISR can preempt the timer ISR right after it read the
/// clock.
#[derive(Default)]
struct PreemptedClock {
    now: AtomicU32,
    hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl PreemptedClock {
    fn set(&self, now: Micros) {
        self.now.store(now, Ordering::Relaxed);
    }

    fn on_next_read(&self, hook: impl FnOnce() + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }
}

impl ClockSource for PreemptedClock {
    fn now_us(&self) -> Micros {
        let now = self.now.load(Ordering::Relaxed);
        let hook = self.hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        now
    }
}

#[test]
fn edge_latched_right_after_the_clock_read_does_not_flicker() {
    let gpio = Arc::new(SimGpio::new());
    let clock = Arc::new(PreemptedClock::default());
    let mut dimmer = Dimmer::new(Arc::clone(&gpio), Arc::clone(&clock));
    let mut tick = ExternalTick::new();
    dimmer.setup(SYNC, DimmerConfig::default(), &mut tick).unwrap();
    let mut scheduler = tick.take().unwrap();
    dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    dimmer.set_level(18, 500).unwrap();

    let latch = scheduler.edge_latch();
    for at in [1_000, 11_000] {
        clock.set(at);
        latch.on_edge();
        scheduler.on_timer_tick();
    }
    assert_eq!(dimmer.sync_status().period_us, 10_000);

    // The edge ISR fires 5 µs after the timer tick sampled the clock.
    clock.set(20_998);
    let isr = {
        let (clock, latch) = (Arc::clone(&clock), latch.clone());
        move || {
            clock.set(21_003);
            latch.on_edge();
        }
    };
    clock.on_next_read(isr);
    scheduler.on_timer_tick();
    assert!(!gpio.level(18), "switch of the previous half-cycle fired");

    clock.set(21_008);
    assert_eq!(
        scheduler.on_timer_tick(),
        Tick::Ran {
            crossing: Crossing::Accepted { period_us: 10_003 },
            fired: 0
        }
    );
    assert!(gpio.level(18), "trailing channel is ON for the first half");

    clock.set(26_000);
    scheduler.on_timer_tick();
    assert!(gpio.level(18));
    clock.set(26_010);
    scheduler.on_timer_tick();
    assert!(!gpio.level(18));
}
