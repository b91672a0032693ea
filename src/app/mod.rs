//! Platform boundary: port traits and outbound events.
//!
//! Everything the dimmer engine needs from the outside world (time, pins,
//! a way to run the tick path, somewhere to report mains health) is a
//! trait in [`ports`], keeping the engine fully testable without real
//! peripherals.

pub mod events;
pub mod ports;
