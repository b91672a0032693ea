//! Channel table: the configured outputs and their per-half-cycle state.
//!
//! A fixed-capacity arena ([`heapless::Vec`]): adding or removing a channel
//! never reallocates, so the tick path can never observe storage moving
//! under it.  Insertion order is preserved across removals.

use serde::Serialize;

use crate::app::ports::{Micros, PinId};
use crate::error::{DimmerError, Result};

use super::level;

/// Maximum number of dimmer channels per controller.
pub const MAX_CHANNELS: usize = 16;

/// Phase-cut strategy for one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DimmerMode {
    /// OFF at the crossing, ON after the delay (triac loads).
    LeadingEdge,
    /// ON at the crossing, OFF after the delay (MOSFET/IGBT loads).
    #[default]
    TrailingEdge,
}

impl DimmerMode {
    /// Pin state at the start of each half-cycle.
    pub const fn start_state(self) -> bool {
        matches!(self, Self::TrailingEdge)
    }

    /// Pin state after this half-cycle's transition.
    pub const fn switched_state(self) -> bool {
        !self.start_state()
    }
}

/// Numeric modes from the binding layer: 0 = leading-edge, 1 = trailing-edge.
impl TryFrom<u8> for DimmerMode {
    type Error = DimmerError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::LeadingEdge),
            1 => Ok(Self::TrailingEdge),
            _ => Err(DimmerError::InvalidArgument("unknown dimmer mode")),
        }
    }
}

/// One configured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimmerChannel {
    pin: PinId,
    mode: DimmerMode,
    /// Requested brightness, 0..=1000.
    promille: u16,
    /// Transition time after the crossing, in µs.
    level_us: Micros,
    /// Transition already fired this half-cycle.
    switched: bool,
}

impl DimmerChannel {
    /// A fully-off channel.  It stays idle until the next accepted crossing.
    pub fn new(pin: PinId, mode: DimmerMode, basis_us: Micros) -> Self {
        Self {
            pin,
            mode,
            promille: 0,
            level_us: level::threshold(mode, 0, basis_us),
            switched: true,
        }
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    pub fn mode(&self) -> DimmerMode {
        self.mode
    }

    pub fn promille(&self) -> u16 {
        self.promille
    }

    pub fn level_us(&self) -> Micros {
        self.level_us
    }

    pub fn switched(&self) -> bool {
        self.switched
    }

    /// Store a new brightness and recompute the threshold against `basis_us`.
    pub(crate) fn set_promille(&mut self, promille: u16, basis_us: Micros) {
        self.promille = promille;
        self.level_us = level::threshold(self.mode, promille, basis_us);
    }

    /// Recompute the threshold for a new half-cycle length.
    pub(crate) fn rescale(&mut self, basis_us: Micros) {
        self.level_us = level::threshold(self.mode, self.promille, basis_us);
    }

    pub(crate) fn set_switched(&mut self, switched: bool) {
        self.switched = switched;
    }

    /// Share of the half-cycle before the transition, in promille.
    pub(crate) fn switch_promille(&self) -> u16 {
        level::switch_promille(self.mode, self.promille)
    }
}

/// Dense, insertion-ordered set of channels with unique pins.
#[derive(Debug, Default)]
pub struct ChannelTable {
    channels: heapless::Vec<DimmerChannel, MAX_CHANNELS>,
}

impl ChannelTable {
    pub const fn new() -> Self {
        Self {
            channels: heapless::Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, pin: PinId) -> bool {
        self.position(pin).is_some()
    }

    pub fn get(&self, pin: PinId) -> Option<&DimmerChannel> {
        self.channels.iter().find(|c| c.pin == pin)
    }

    pub fn get_mut(&mut self, pin: PinId) -> Option<&mut DimmerChannel> {
        self.channels.iter_mut().find(|c| c.pin == pin)
    }

    /// Append a channel.  A pin already present is left untouched.
    pub fn insert(&mut self, channel: DimmerChannel) -> Result<()> {
        if self.contains(channel.pin) {
            return Ok(());
        }
        self.channels
            .push(channel)
            .map_err(|_| DimmerError::TableFull)
    }

    /// Remove by pin, shifting later entries down to keep their order.
    pub fn remove(&mut self, pin: PinId) -> Option<DimmerChannel> {
        let index = self.position(pin)?;
        Some(self.channels.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimmerChannel> {
        self.channels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DimmerChannel> {
        self.channels.iter_mut()
    }

    fn position(&self, pin: PinId) -> Option<usize> {
        self.channels.iter().position(|c| c.pin == pin)
    }
}
