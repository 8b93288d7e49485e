//! Audio-path domain newtypes for compile-time safety.
//!
//! The preamp has 4 stereo sources and 6 output channels (zones). Register
//! bytes pack these as bit-per-source, bit-per-channel or 2-bit source
//! selectors; these newtypes make an out-of-range index unrepresentable once
//! the byte has been unpacked.
//!
//! - `Source`: input index 0–3
//! - `Channel`: output channel index 0–5
//! - `InputType`: analog (RCA) or digital input for a source

use thiserror_no_std::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── Source ───────────────────────────────────────────────────────────────────

/// Audio source (input) index, 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Source(u8);

impl Source {
    /// Number of sources on the board.
    pub const COUNT: usize = 4;

    /// Every source in index order.
    pub const ALL: [Source; Self::COUNT] = [Source(0), Source(1), Source(2), Source(3)];

    /// Create a `Source`, returning an error if `index > 3`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index >= 4`.
    pub fn try_new(index: u8) -> Result<Self, OutOfRangeError> {
        if usize::from(index) >= Self::COUNT {
            Err(OutOfRangeError {
                value: u32::from(index),
                min: 0,
                max: 3,
            })
        } else {
            Ok(Self(index))
        }
    }

    /// Decode a 2-bit routing selector. Bits above bit 1 are ignored, so this
    /// is total over `u8`.
    #[must_use]
    pub const fn from_selector(bits: u8) -> Self {
        Self(bits & 0b11)
    }

    /// Return the source index (0–3).
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Bit mask of this source in a bit-per-source register byte.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // index < 4, shift cannot overflow
    pub const fn mask(self) -> u8 {
        1 << self.0
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

/// Output channel (zone) index, 0–5.
///
/// The wire protocol numbers channels from 1 (`VOL_CH1` .. `VOL_CH6`); this
/// type is always 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Channel(u8);

impl Channel {
    /// Number of output channels on one preamp board.
    pub const COUNT: usize = 6;

    /// Every channel in index order.
    pub const ALL: [Channel; Self::COUNT] = [
        Channel(0),
        Channel(1),
        Channel(2),
        Channel(3),
        Channel(4),
        Channel(5),
    ];

    /// Create a `Channel`, returning an error if `index > 5`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index >= 6`.
    pub fn try_new(index: u8) -> Result<Self, OutOfRangeError> {
        if usize::from(index) >= Self::COUNT {
            Err(OutOfRangeError {
                value: u32::from(index),
                min: 0,
                max: 5,
            })
        } else {
            Ok(Self(index))
        }
    }

    /// Return the channel index (0–5).
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Bit mask of this channel in a bit-per-channel register byte.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // index < 6, shift cannot overflow
    pub const fn mask(self) -> u8 {
        1 << self.0
    }
}

// ── InputType ────────────────────────────────────────────────────────────────

/// Physical input selected for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputType {
    /// RCA line input (register bit = 0)
    #[default]
    Analog,
    /// Digital input (register bit = 1)
    Digital,
}

impl InputType {
    /// Decode one bit of the source-type register.
    #[must_use]
    pub const fn from_bit(set: bool) -> Self {
        if set {
            Self::Digital
        } else {
            Self::Analog
        }
    }

    /// Returns `true` for [`InputType::Digital`].
    #[must_use]
    pub const fn is_digital(self) -> bool {
        matches!(self, Self::Digital)
    }
}
