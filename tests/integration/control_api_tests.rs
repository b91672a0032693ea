//! Control API behaviour: channel lifecycle, errors, diagnostics.

use acdimmer::dimmer::MAX_CHANNELS;
use acdimmer::{DimmerConfig, DimmerError, DimmerMode};

use crate::mock_hw::{Rig, SYNC};

#[test]
fn add_twice_keeps_the_first_entry() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.set_level(18, 300).unwrap();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();

    let snap = rig.dimmer.list_debug().unwrap();
    assert_eq!(snap.channels.len(), 1);
    let ch = snap.channel(18).unwrap();
    assert_eq!(ch.mode, DimmerMode::LeadingEdge);
    assert_eq!(ch.promille, 300);
}

#[test]
fn readding_after_remove_resets_to_off() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::LeadingEdge).unwrap();
    rig.dimmer.set_level(18, 800).unwrap();
    rig.dimmer.remove(18).unwrap();
    rig.dimmer.add(18, DimmerMode::LeadingEdge).unwrap();

    let snap = rig.dimmer.list_debug().unwrap();
    let ch = snap.channel(18).unwrap();
    assert_eq!(ch.promille, 0);
    assert_eq!(ch.level_us, 20_000, "leading-edge off = maximal delay");
}

#[test]
fn remove_keeps_order_of_the_rest() {
    let mut rig = Rig::new();
    for pin in [16, 17, 18, 19] {
        rig.dimmer.add(pin, DimmerMode::TrailingEdge).unwrap();
    }
    rig.dimmer.remove(17).unwrap();
    assert_eq!(rig.dimmer.pins(), &[16, 18, 19]);
    let pins: Vec<_> = rig.dimmer.list_debug().unwrap().channels.iter().map(|c| c.pin).collect();
    assert_eq!(pins, [16, 18, 19]);
}

#[test]
fn errors_are_reported_synchronously() {
    let mut rig = Rig::new();
    assert_eq!(rig.dimmer.remove(21), Err(DimmerError::UnknownChannel(21)));
    assert_eq!(rig.dimmer.set_level(21, 10), Err(DimmerError::UnconfiguredChannel(21)));
    assert!(matches!(
        rig.dimmer.add(SYNC, DimmerMode::TrailingEdge),
        Err(DimmerError::InvalidArgument(_))
    ));
    assert!(matches!(
        rig.dimmer.add(200, DimmerMode::TrailingEdge),
        Err(DimmerError::InvalidArgument(_))
    ));
}

#[test]
fn full_table_fails_before_touching_hardware() {
    let mut rig = Rig::new();
    for pin in 5..5 + MAX_CHANNELS as i32 {
        rig.dimmer.add(pin, DimmerMode::TrailingEdge).unwrap();
    }
    assert_eq!(rig.dimmer.add(40, DimmerMode::TrailingEdge), Err(DimmerError::TableFull));
    assert!(!rig.gpio.is_configured(40));
    assert!(rig.gpio.writes_between(40, 0, u32::MAX).is_empty());
}

#[test]
fn mains_frequency_follows_measured_period() {
    let mut rig = Rig::new();
    assert!(rig.dimmer.mains_frequency().abs() < f32::EPSILON);
    rig.mains(1_000, 10_000, 3);
    assert!((rig.dimmer.mains_frequency() - 50.0).abs() < 0.01);

    let mut rig = Rig::new();
    rig.mains(1_000, 8_333, 3);
    assert!((rig.dimmer.mains_frequency() - 60.0).abs() < 0.01);
}

#[test]
fn list_debug_reports_sync_diagnostics() {
    let mut rig = Rig::new();
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    let t0 = rig.mains(1_000, 10_000, 4);

    let snap = rig.dimmer.list_debug().unwrap();
    assert_eq!(snap.sync.period_us, 10_000);
    assert_eq!(snap.sync.crossings, 4);
    assert_eq!(snap.sync.last_crossing_us, t0);
    assert_eq!(snap.sync.rejected, 0);
    assert!(snap.to_json().unwrap().contains("\"crossings\":4"));
}

#[test]
fn options_from_json_drive_timing() {
    let config = DimmerConfig::from_json(r#"{"nominal_mains_hz": 60, "min_mains_hz": 55}"#).unwrap();
    let mut rig = Rig::with_config(config);
    rig.dimmer.add(18, DimmerMode::TrailingEdge).unwrap();
    rig.dimmer.set_level(18, 500).unwrap();
    // No mains yet: nominal 60 Hz half-cycle is 8333 µs.
    assert_eq!(rig.dimmer.list_debug().unwrap().channel(18).unwrap().level_us, 4_167);
}
