//! Outbound dimmer events.
//!
//! The [`MainsSupervisor`](crate::supervisor::MainsSupervisor) emits these
//! through the [`EventSink`](super::ports::EventSink) port, only on
//! transitions.  Adapters on the other side decide what to do with them.

/// Mains-health events observed from the control path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DimmerEvent {
    /// No crossing within the loss timeout; outputs were driven off.
    MainsLost,

    /// Crossings are being accepted again with a measured period.
    MainsRestored { frequency_hz: f32 },

    /// Edges were rejected as noise since the previous poll.
    SyncNoise { rejected: u32 },
}
