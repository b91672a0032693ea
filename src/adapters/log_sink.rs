//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing mains-health events to the logger
//! (UART / USB-CDC on the device).  An MQTT adapter or the scripting
//! layer's callback would implement the same trait.

use log::{info, warn};

use crate::app::events::DimmerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DimmerEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DimmerEvent) {
        match event {
            DimmerEvent::MainsLost => warn!("MAINS | lost, outputs held off"),
            DimmerEvent::MainsRestored { frequency_hz } => {
                info!("MAINS | restored at {:.2} Hz", frequency_hz);
            }
            DimmerEvent::SyncNoise { rejected } => {
                warn!("SYNC | {} noise edges rejected", rejected);
            }
        }
    }
}
