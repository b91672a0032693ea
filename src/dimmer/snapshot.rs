//! Diagnostic snapshot returned by `list_debug`.

use core::fmt;

use serde::Serialize;

use crate::app::ports::{Micros, PinId};

use super::channel::{ChannelTable, DimmerChannel, DimmerMode, MAX_CHANNELS};
use super::sync::SyncStatus;

/// One channel as seen at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelState {
    pub pin: PinId,
    pub mode: DimmerMode,
    pub promille: u16,
    pub level_us: Micros,
    pub switched: bool,
}

impl From<&DimmerChannel> for ChannelState {
    fn from(c: &DimmerChannel) -> Self {
        Self {
            pin: c.pin(),
            mode: c.mode(),
            promille: c.promille(),
            level_us: c.level_us(),
            switched: c.switched(),
        }
    }
}

/// Channel table plus sync diagnostics, copied out under quiescence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub sync: SyncStatus,
    pub mains_frequency_hz: f32,
    pub channels: heapless::Vec<ChannelState, MAX_CHANNELS>,
}

impl DebugSnapshot {
    pub(crate) fn capture(sync: SyncStatus, table: &ChannelTable) -> Self {
        // The table never holds more than MAX_CHANNELS, so nothing is dropped.
        let channels = table.iter().map(ChannelState::from).collect();
        Self {
            mains_frequency_hz: sync.mains_frequency(),
            sync,
            channels,
        }
    }

    pub fn channel(&self, pin: PinId) -> Option<&ChannelState> {
        self.channels.iter().find(|c| c.pin == pin)
    }

    /// JSON form for the binding layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One header line, then one line per channel.
impl fmt::Display for DebugSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p={} crossings={} edges={} rejected={} dropouts={} t={}",
            self.sync.period_us,
            self.sync.crossings,
            self.sync.edges,
            self.sync.rejected,
            self.sync.dropouts,
            self.sync.last_crossing_us
        )?;
        for c in &self.channels {
            write!(
                f,
                "\n  pin={} mode={:?} promille={} level={} switched={}",
                c.pin, c.mode, c.promille, c.level_us, c.switched
            )?;
        }
        Ok(())
    }
}
