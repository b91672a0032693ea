//! Switching instants relative to the detected crossing (pull mode, 10 µs
//! polling).

use acdimmer::DimmerMode;

use crate::mock_hw::Rig;

const P: u32 = 10_000;

#[test]
fn trailing_half_brightness_is_on_for_the_first_half() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();

    let t0 = rig.mains(1_000, P, 2);
    rig.run_to(t0 + P - 10, 10);

    assert!(rig.gpio.level_at(18, t0));
    assert!(rig.gpio.level_at(18, t0 + 5_000));
    assert!(!rig.gpio.level_at(18, t0 + 5_010));
    assert!(!rig.gpio.level_at(18, t0 + P - 10));
}

#[test]
fn leading_three_quarter_brightness_is_off_for_the_first_quarter() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.set_level(18, 750).unwrap();
    assert_eq!(rig.dimmer.list_debug().unwrap().channel(18).unwrap().level_us, 2_500);

    let t0 = rig.mains(1_000, P, 2);
    rig.run_to(t0 + P - 10, 10);

    assert!(!rig.gpio.level_at(18, t0));
    assert!(!rig.gpio.level_at(18, t0 + 2_500));
    assert!(rig.gpio.level_at(18, t0 + 2_510));
    assert!(rig.gpio.level_at(18, t0 + P - 10));
}

#[test]
fn one_transition_per_channel_per_half_cycle() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.add(19, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.set_level(18, 420).unwrap();
    rig.dimmer.set_level(19, 420).unwrap();

    let t0 = rig.mains(1_000, P, 5);
    rig.run_to(t0 + P - 10, 10);

    for pin in [18, 19] {
        for k in 1..4 {
            let start = 1_000 + k * P;
            let writes = rig.gpio.writes_between(pin, start, start + P);
            // Start state at the crossing, one switch later.
            assert_eq!(writes.len(), 2, "pin {pin}, half-cycle {k}: {writes:?}");
            assert_eq!(writes[0].at, start);
            assert_ne!(writes[0].high, writes[1].high);
        }
    }
}

#[test]
fn full_and_zero_levels_never_flicker() {
    let mut rig = Rig::new();
    rig.dimmer.add(16, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.add(17, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.add(19, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.set_level(16, 1000).unwrap();
    rig.dimmer.set_level(17, 1000).unwrap();
    // 18 and 19 stay at 0.

    let t0 = rig.mains(1_000, P, 4);
    rig.run_to(t0 + P - 10, 10);

    for (pin, on) in [(16, true), (17, true), (18, false), (19, false)] {
        let writes = rig.gpio.writes_between(pin, 1_000 + P, t0 + P);
        assert!(writes.iter().all(|w| w.high == on), "pin {pin}: {writes:?}");
    }
}

#[test]
fn thresholds_follow_frequency_drift() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();

    let t0 = rig.mains(1_000, 8_334, 3);
    assert_eq!(rig.dimmer.list_debug().unwrap().channel(18).unwrap().level_us, 4_167);

    rig.run_to(t0 + 8_000, 10);
    assert!(rig.gpio.level_at(18, t0 + 4_167));
    assert!(!rig.gpio.level_at(18, t0 + 4_180));
}

#[test]
fn lowered_level_fires_on_the_next_tick() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 800).unwrap();

    let t0 = rig.mains(1_000, P, 2);
    rig.run_to(t0 + 3_000, 10);
    assert!(rig.gpio.level(18));

    // New threshold (2000 µs) already lies behind the elapsed time.
    rig.dimmer.set_level(18, 200).unwrap();
    rig.run_to(t0 + 3_010, 10);
    assert!(!rig.gpio.level(18));
    assert_eq!(rig.gpio.writes_between(18, t0 + 3_001, t0 + 3_011).len(), 1);
}

#[test]
fn full_brightness_set_mid_cycle_survives_a_missed_edge() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();

    // 100 Hz mains: 2×P is shorter than the loss timeout.
    let t0 = rig.mains(1_000, 5_000, 3);
    rig.run_to(t0 + 100, 10);
    rig.dimmer.set_level(18, 1000).unwrap();
    assert_eq!(rig.dimmer.list_debug().unwrap().channel(18).unwrap().level_us, 10_000);

    // The next edge never comes.
    rig.run_to(t0 + 12_220, 10);
    assert!(rig.gpio.writes_between(18, t0 + 1, t0 + 12_221).is_empty());
    assert!(rig.gpio.level(18));
    assert_eq!(rig.dimmer.sync_status().dropouts, 0);

    // Only the mains-loss hold-off turns it off.
    rig.run_to(t0 + 12_240, 10);
    assert_eq!(rig.dimmer.sync_status().dropouts, 1);
    assert!(!rig.gpio.level(18));
}
