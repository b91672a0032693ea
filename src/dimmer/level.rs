//! Brightness → switching threshold.
//!
//! Brightness is promille for both modes: 1000 never switches the load off
//! during a half-cycle, 0 never switches it on.  Leading-edge channels
//! start OFF, so their delay is the *dark* share of the half-cycle and the
//! request is inverted; trailing-edge channels start ON and their delay is
//! the lit share.

use crate::app::ports::Micros;

use super::channel::DimmerMode;

/// Full brightness.
pub const FULL_SCALE: u16 = 1000;

/// Saturate a raw request from the binding layer into `0..=1000`.
pub fn clamp_promille(raw: i32) -> u16 {
    raw.clamp(0, i32::from(FULL_SCALE)) as u16
}

/// Share of the half-cycle, in promille, that elapses before the transition.
pub fn switch_promille(mode: DimmerMode, promille: u16) -> u16 {
    let promille = promille.min(FULL_SCALE);
    match mode {
        DimmerMode::LeadingEdge => FULL_SCALE - promille,
        DimmerMode::TrailingEdge => promille,
    }
}

/// Transition time after the crossing for a half-cycle of `basis_us`.
///
/// `2 × basis` means "no transition this half-cycle"; `0` means "at the
/// crossing".  In between the value is rounded to the nearest µs.
pub fn threshold(mode: DimmerMode, promille: u16, basis_us: Micros) -> Micros {
    match switch_promille(mode, promille) {
        FULL_SCALE => basis_us.saturating_mul(2),
        0 => 0,
        share => {
            let scaled = u64::from(share) * u64::from(basis_us) + u64::from(FULL_SCALE / 2);
            (scaled / u64::from(FULL_SCALE)) as Micros
        }
    }
}
