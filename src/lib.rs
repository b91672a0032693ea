//! Phase-cut AC mains dimmer engine.
//!
//! Detects mains zero crossings on a sync input and switches any number of
//! load outputs at a computed delay after each crossing: leading-edge
//! (triac) or trailing-edge (MOSFET) per channel, brightness in promille.
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on the host the same engine runs against simulated
//! pins.
//!
//! ```no_run
//! use acdimmer::adapters::{sim::SimGpio, time::MonotonicClock};
//! use acdimmer::drivers::poller::PollingDriver;
//! use acdimmer::{Dimmer, DimmerConfig, DimmerMode};
//!
//! # fn main() -> acdimmer::Result<()> {
//! let mut dimmer = Dimmer::new(SimGpio::new(), MonotonicClock::new());
//! let mut driver = PollingDriver::new();
//! dimmer.setup(4, DimmerConfig::default(), &mut driver)?;
//! dimmer.add(18, DimmerMode::LeadingEdge)?;
//! dimmer.set_level(18, 400)?;
//! # Ok(())
//! # }
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dimmer;
pub mod drivers;
pub mod pins;
pub mod supervisor;

mod error;

pub use config::DimmerConfig;
pub use dimmer::{DebugSnapshot, Dimmer, DimmerMode, PhaseScheduler, SyncStatus};
pub use error::{DimmerError, HardwareFault, Result};
