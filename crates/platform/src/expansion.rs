//! Expansion port control
//!
//! Expansion units daisy-chain off the main preamp. The upstream board holds
//! each downstream unit's NRST and BOOT0 lines and can forward its own USART2
//! receive stream to the chain (UART passthrough), which is how a host
//! flashes expansion units.

/// Pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    #[default]
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// Expansion-port outputs.
pub trait ExpansionPort {
    /// Error type
    type Error: core::fmt::Debug;

    /// Drive the expansion NRST_OUT line.
    fn set_reset(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Drive the expansion BOOT0_OUT line.
    fn set_boot(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Arm (`true`) or disarm (`false`) the USART2 receive interrupt that
    /// forwards host UART traffic to expansion units.
    fn set_uart_passthrough(&mut self, enabled: bool) -> Result<(), Self::Error>;
}
