//! Collaborators the register write path actuates.

use preamp_platform::{AudioPath, ExpansionPort, MonitorBus};

/// The board-side hardware behind the register map.
///
/// Generic so the same write path drives the real peripherals and the
/// host-side mocks.
pub struct Board<A, X, M> {
    /// Input muxes, routing, mute, standby, volume.
    pub audio: A,
    /// Expansion-unit reset/boot lines and UART passthrough.
    pub expansion: X,
    /// Secondary bus: power monitor, front panel, ADC.
    pub monitor: M,
}

impl<A, X, M> Board<A, X, M>
where
    A: AudioPath,
    X: ExpansionPort,
    M: MonitorBus,
{
    /// Bundle the collaborators.
    pub fn new(audio: A, expansion: X, monitor: M) -> Self {
        Self {
            audio,
            expansion,
            monitor,
        }
    }
}
