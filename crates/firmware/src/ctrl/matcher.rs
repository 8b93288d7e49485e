//! Own-address match detection.

use preamp_platform::SlaveBus;

/// Returns `true` once the host has addressed this unit and the match has
/// not been acknowledged yet. Pure flag read; the servicer's acknowledge is
/// what clears it.
pub fn is_addressed<B: SlaveBus>(bus: &B) -> bool {
    bus.is_addressed()
}
