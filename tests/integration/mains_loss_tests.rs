//! Debounce, mains loss and recovery.

use acdimmer::DimmerMode;

use crate::mock_hw::Rig;

const P: u32 = 10_000;

#[test]
fn edges_closer_than_minimum_period_count_once() {
    let mut rig = Rig::new();
    rig.edge_at(1_000);
    rig.edge_at(1_050);
    rig.edge_at(3_000);

    let status = rig.dimmer.sync_status();
    assert_eq!(status.crossings, 1);
    assert_eq!(status.edges, 3);
    assert_eq!(status.rejected, 2);
    assert_eq!(status.last_crossing_us, 1_000);
}

#[test]
fn ringing_inside_the_gate_is_ignored() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();
    let t0 = rig.mains(1_000, P, 3);

    // A glitch at 60% of the half-cycle is never even sampled.
    rig.run_to(t0 + 6_000, 10);
    rig.edge_at(t0 + 6_000);
    let status = rig.dimmer.sync_status();
    assert_eq!(status.crossings, 3);
    assert_eq!(status.last_crossing_us, t0);
    assert!(!rig.gpio.level(18), "channel keeps its switched state");
}

#[test]
fn loss_drives_all_outputs_off_within_one_timeout() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.add(19, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.set_level(18, 1000).unwrap();
    rig.dimmer.set_level(19, 1000).unwrap();

    let t0 = rig.mains(1_000, P, 3);
    assert!(rig.gpio.level(18));
    assert!(rig.gpio.level(19));

    // Edges stop.
    rig.run_to(t0 + 12_222, 10);
    assert!(rig.dimmer.mains_frequency() > 0.0);
    rig.run_to(t0 + 12_232, 10);

    assert!(rig.dimmer.mains_frequency().abs() < f32::EPSILON);
    assert!(!rig.gpio.level(18));
    assert!(!rig.gpio.level(19));
    assert_eq!(rig.dimmer.sync_status().dropouts, 1);

    // Stays off, no further writes.
    let before = rig.gpio.writes_between(18, 0, u32::MAX).len();
    rig.run_to(t0 + 40_000, 10);
    assert_eq!(rig.gpio.writes_between(18, 0, u32::MAX).len(), before);
    assert_eq!(rig.dimmer.sync_status().dropouts, 1);
}

#[test]
fn recovery_is_automatic() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();

    let t0 = rig.mains(1_000, P, 2);
    rig.run_to(t0 + 30_000, 10);
    assert!(rig.dimmer.mains_frequency().abs() < f32::EPSILON);

    // Mains returns at 60 Hz.
    let t1 = rig.mains(t0 + 30_000, 8_334, 3);
    assert!((rig.dimmer.mains_frequency() - 60.0).abs() < 0.05);
    rig.run_to(t1 + 8_000, 10);
    assert!(rig.gpio.level_at(18, t1 + 4_160));
    assert!(!rig.gpio.level_at(18, t1 + 4_170));
}

#[test]
fn no_mains_at_all_keeps_outputs_idle() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 1000).unwrap();
    rig.run_to(50_000, 10);

    assert!(!rig.gpio.level(18));
    assert_eq!(rig.dimmer.sync_status().crossings, 0);
    assert_eq!(rig.dimmer.sync_status().dropouts, 0);
}
