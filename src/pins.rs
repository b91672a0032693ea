//! GPIO assignments for the reference dimmer board (ESP32-S3 + RobotDyn-style
//! triac module with an optocoupled zero-cross detector).
//!
//! Single source of truth for the firmware binary and the config defaults.
//! The engine itself takes pins at runtime, so other boards only need a
//! different `setup`/`add` call.

// ---------------------------------------------------------------------------
// Zero-cross detector
// ---------------------------------------------------------------------------

/// Digital input: optocoupler output, HIGH pulse around each crossing.
/// Open-collector, so the internal pull-up is enabled.
pub const ZERO_CROSS_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Triac gate outputs
// ---------------------------------------------------------------------------

/// Channel 1: incandescent / halogen lamp, leading-edge.
pub const LAMP_GPIO: i32 = 18;
/// Channel 2: MOSFET-switched LED driver, trailing-edge.
pub const LED_DRIVER_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Highest GPIO number on the ESP32-S3.
pub const MAX_GPIO: i32 = 48;
