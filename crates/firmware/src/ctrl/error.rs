//! Transaction errors.
//!
//! None of these reach the host as a bus error: by the time one is returned
//! the servicer has released the bus. They exist for logging and for tests.

use core::fmt;

use thiserror_no_std::Error;

/// Point in a transaction where the servicer was waiting on the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitStage {
    /// Register byte after the address phase.
    RegisterByte,
    /// Repeated start (read), data byte (write) or STOP.
    Direction,
    /// Transmit request after the repeated start.
    TransmitReady,
    /// NACK / STOP closing the transaction.
    Completion,
}

impl WaitStage {
    /// Short name for log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegisterByte => "register byte",
            Self::Direction => "direction",
            Self::TransmitReady => "transmit ready",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction that could not be serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceError {
    /// The master stopped clocking.
    #[error("timed out waiting for {stage}")]
    Timeout {
        /// Where the wait was.
        stage: WaitStage,
    },
    /// The cancel token fired mid-transaction.
    #[error("cancelled while waiting for {stage}")]
    Cancelled {
        /// Where the wait was.
        stage: WaitStage,
    },
    /// The master read without writing a register byte first. Every
    /// requested byte was answered with `0xFF`.
    #[error("read without register byte")]
    MissingRegister,
    /// The master moved more than one data byte. Writes are not applied;
    /// reads were padded with `0xFF`.
    #[error("{count} extra byte(s) on register {register:#04x}")]
    ExtraBytes {
        /// Register of the transaction.
        register: u8,
        /// Bytes beyond the first.
        count: usize,
    },
}

impl ServiceError {
    /// The wait stage, for timeouts and cancellations.
    pub const fn stage(&self) -> Option<WaitStage> {
        match self {
            Self::Timeout { stage } | Self::Cancelled { stage } => Some(*stage),
            Self::MissingRegister | Self::ExtraBytes { .. } => None,
        }
    }
}
