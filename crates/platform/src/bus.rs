//! Controller-bus slave peripheral abstraction
//!
//! The preamp is addressed by the host over I2C1 and never drives the clock.
//! The protocol core only ever observes peripheral flags and moves single
//! bytes; [`SlaveBus`] is exactly that surface, modelled on an STM32F0-style
//! I2C block (ISR flags, ICR clear bits, RXDR/TXDR data registers).
//!
//! Any flag the trait exposes as pending keeps the bus clock stretched until
//! the matching clear/read/write call is made.

use bitflags::bitflags;

use crate::audio_types::OutOfRangeError;

bitflags! {
    /// Snapshot of the slave peripheral's interrupt/status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BusStatus: u8 {
        /// Own address matched (ISR.ADDR). Cleared by
        /// [`SlaveBus::acknowledge_address`].
        const ADDRESS_MATCH = 1 << 0;
        /// A received byte is waiting (ISR.RXNE). Cleared by
        /// [`SlaveBus::receive_byte`].
        const RX_NOT_EMPTY = 1 << 1;
        /// The master is clocking out a byte and the transmit register is
        /// free (ISR.TXIS). Cleared by [`SlaveBus::transmit_byte`].
        const TX_REQUEST = 1 << 2;
        /// The master NACKed the last transmitted byte (ISR.NACKF).
        const NACK = 1 << 3;
        /// STOP condition seen (ISR.STOPF).
        const STOP = 1 << 4;
        /// Transfer direction of the current address phase (ISR.DIR),
        /// set when the master reads.
        const DIR_READ = 1 << 5;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "BusStatus({=u8:#04x})", self.bits());
    }
}

/// Direction of the current transfer, from the slave's point of view of the
/// master's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    /// Master writes to the slave.
    Write,
    /// Master reads from the slave.
    Read,
}

/// Controller-bus slave peripheral.
///
/// All methods are non-blocking. Waiting is the caller's job, which keeps
/// the timeout policy out of the peripheral.
pub trait SlaveBus {
    /// Read the current status flags. Must not clear anything.
    fn status(&self) -> BusStatus;

    /// Acknowledge the pending address match. Releases a clock stretch on
    /// the address phase.
    fn acknowledge_address(&mut self);

    /// Take the received byte. Releases a clock stretch on the data phase.
    fn receive_byte(&mut self) -> u8;

    /// Queue `byte` for transmission to the master.
    fn transmit_byte(&mut self, byte: u8);

    /// Clear a pending STOP flag.
    fn clear_stop(&mut self);

    /// Clear a pending NACK flag.
    fn clear_nack(&mut self);

    /// NACK the next byte the master sends. Used to reject burst writes.
    fn nack_next(&mut self);

    /// Drop whatever is left of an abandoned transaction: discard a pending
    /// received byte, clear STOP and NACK, and stop acknowledging until the
    /// next address match. On the STM32 this is a PE toggle, which also
    /// releases a clock stretch.
    fn recover(&mut self);

    /// Returns `true` while an address match is pending acknowledgement.
    fn is_addressed(&self) -> bool {
        self.status().contains(BusStatus::ADDRESS_MATCH)
    }

    /// Returns `true` when a received byte is waiting.
    fn is_receive_ready(&self) -> bool {
        self.status().contains(BusStatus::RX_NOT_EMPTY)
    }

    /// Returns `true` when the master is waiting for a byte from us.
    fn is_transmit_ready(&self) -> bool {
        self.status().contains(BusStatus::TX_REQUEST)
    }

    /// Direction of the most recent address phase.
    fn direction(&self) -> TransferDirection {
        if self.status().contains(BusStatus::DIR_READ) {
            TransferDirection::Read
        } else {
            TransferDirection::Write
        }
    }
}

// ── SlaveAddress ─────────────────────────────────────────────────────────────

/// Own 7-bit slave address on the controller bus.
///
/// ## Reserved I2C addresses (I2C specification):
/// - 0x00–0x07: reserved (general call, CBUS, etc.)
/// - 0x78–0x7F: reserved (10-bit address prefix, device ID, etc.)
///
/// The main unit answers at 0x08; each expansion unit in the chain is
/// assigned the next multiple of 8 by its upstream neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Address of the main preamp board.
    pub const MAIN_UNIT: SlaveAddress = SlaveAddress(0x08);

    /// Create a slave address, rejecting I2C-reserved ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `addr <= 0x07` or `addr >= 0x78`.
    pub fn try_new(addr: u8) -> Result<Self, OutOfRangeError> {
        if addr <= 0x07 || addr >= 0x78 {
            Err(OutOfRangeError {
                value: u32::from(addr),
                min: 0x08,
                max: 0x77,
            })
        } else {
            Ok(Self(addr))
        }
    }

    /// Return the 7-bit address.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Address shifted left by one (`0bXXXXXXX0`), the form the peripheral's
    /// own-address register expects.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // value <= 0x77, shift fits in u8
    pub const fn pre_shifted(self) -> u8 {
        self.0 << 1
    }
}

impl Default for SlaveAddress {
    fn default() -> Self {
        Self::MAIN_UNIT
    }
}

/// Slave peripheral configuration applied before the first transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveConfig {
    /// Own address.
    pub address: SlaveAddress,
    /// Analog noise filter on SCL/SDA.
    pub analog_filter: bool,
    /// Digital noise filter length in I2C kernel clocks (0 = off, max 15).
    pub digital_filter: u8,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            address: SlaveAddress::MAIN_UNIT,
            analog_filter: true,
            digital_filter: 0,
        }
    }
}
