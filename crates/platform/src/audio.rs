//! Audio path actuation abstraction
//!
//! Input-type selection, channel-to-source routing, mute, standby and volume
//! are opaque hardware actions as far as the register interface is
//! concerned. On the board they are GPIO writes to the input muxes and
//! I2C2 writes to the volume controllers; tests use
//! [`mocks::MockAudioPath`](crate::mocks::MockAudioPath).

use crate::audio_types::{Channel, InputType, Source};

/// Audio path actuation.
pub trait AudioPath {
    /// Error type
    type Error: core::fmt::Debug;

    /// Select the analog or digital input for `source`.
    fn configure_input(
        &mut self,
        source: Source,
        input: InputType,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Route `source` to `channel`.
    fn connect_channel(
        &mut self,
        source: Source,
        channel: Channel,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Mute or unmute one channel.
    fn set_mute(
        &mut self,
        channel: Channel,
        muted: bool,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Put the amplifiers in standby and drop audio power.
    fn standby(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Restore audio power and leave standby.
    fn unstandby(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Set the raw volume byte of one channel.
    fn set_volume(
        &mut self,
        channel: Channel,
        value: u8,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}
