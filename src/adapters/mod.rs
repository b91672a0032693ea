//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements  | Connects to                        |
//! |------------|-------------|------------------------------------|
//! | `esp_gpio` | GpioPort    | ESP-IDF GPIO registers             |
//! | `hal`      | GpioPort    | any embedded-hal 1.0 pin objects   |
//! | `sim`      | GpioPort    | in-memory pins (tests, fuzzing)    |
//! |            | ClockSource | hand-driven clock                  |
//! | `time`     | ClockSource | ESP32 high-resolution timer        |
//! | `log_sink` | EventSink   | Serial log output                  |

pub mod esp_gpio;
pub mod hal;
pub mod log_sink;
pub mod sim;
pub mod time;
