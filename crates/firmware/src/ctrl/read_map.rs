//! Register read dispatch.
//!
//! A 256-entry table from wire address to a [`ReadHandler`], built at
//! compile time from [`Register`]. Lookup is total: any address without a
//! readable register reads as [`UNMAPPED_READ`].

use preamp_platform::Channel;

use super::registers::{encode_mute, encode_source_types, Register, RoutingGroup};
use crate::state::DeviceState;

/// Byte returned for addresses with nothing to read.
pub const UNMAPPED_READ: u8 = 0xFF;

/// What to compute for a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadHandler {
    /// Unknown or write-only address.
    Unmapped,
    /// Source input types.
    SourceTypes,
    /// One routing group.
    Routing(RoutingGroup),
    /// Mute flags.
    Mute,
    /// 1 while in standby.
    Standby,
    /// One channel's volume.
    Volume(Channel),
    /// Power monitor inputs.
    PowerStatus,
    /// Fan override flag.
    FanOverride,
    /// LED override flag.
    LedOverride,
    /// LED byte.
    LedValue,
    /// Expansion control byte.
    Expansion,
    /// HV1 voltage.
    Hv1Voltage,
    /// HV1 temperature.
    Hv1Temperature,
    /// Amplifier 1 temperature.
    Amp1Temperature,
    /// Amplifier 2 temperature.
    Amp2Temperature,
    /// Major version.
    VersionMajor,
    /// Minor version.
    VersionMinor,
    /// Byte `n` (0..=3) of the hash register block.
    GitHash(u8),
}

const fn handler_for(register: Register) -> ReadHandler {
    if !register.access().readable() {
        return ReadHandler::Unmapped;
    }
    match register {
        Register::SrcAd => ReadHandler::SourceTypes,
        Register::Ch321 => ReadHandler::Routing(RoutingGroup::Low),
        Register::Ch654 => ReadHandler::Routing(RoutingGroup::High),
        Register::Mute => ReadHandler::Mute,
        Register::Standby => ReadHandler::Standby,
        Register::VolCh1
        | Register::VolCh2
        | Register::VolCh3
        | Register::VolCh4
        | Register::VolCh5
        | Register::VolCh6 => match register.volume_channel() {
            Some(channel) => ReadHandler::Volume(channel),
            None => ReadHandler::Unmapped,
        },
        Register::PowerStatus => ReadHandler::PowerStatus,
        Register::FanCtrl => ReadHandler::FanOverride,
        Register::LedCtrl => ReadHandler::LedOverride,
        Register::LedVal => ReadHandler::LedValue,
        Register::Expansion => ReadHandler::Expansion,
        Register::Hv1Voltage => ReadHandler::Hv1Voltage,
        Register::Hv1Temp => ReadHandler::Hv1Temperature,
        Register::Amp1Temp => ReadHandler::Amp1Temperature,
        Register::Amp2Temp => ReadHandler::Amp2Temperature,
        Register::VersionMajor => ReadHandler::VersionMajor,
        Register::VersionMinor => ReadHandler::VersionMinor,
        Register::GitHash65 => ReadHandler::GitHash(0),
        Register::GitHash43 => ReadHandler::GitHash(1),
        Register::GitHash21 => ReadHandler::GitHash(2),
        Register::GitHash0D => ReadHandler::GitHash(3),
        Register::ExternalGpio | Register::AdcDebug => ReadHandler::Unmapped,
    }
}

#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)] // addr < 256
#[allow(clippy::cast_possible_truncation)] // addr < 256
const fn build() -> [ReadHandler; 256] {
    let mut map = [ReadHandler::Unmapped; 256];
    let mut addr = 0usize;
    while addr < 256 {
        if let Some(register) = Register::from_address(addr as u8) {
            map[addr] = handler_for(register);
        }
        addr += 1;
    }
    map
}

/// Read table, indexed by wire address.
pub static READ_MAP: [ReadHandler; 256] = build();

/// Handler for a wire address.
pub fn handler(addr: u8) -> ReadHandler {
    READ_MAP
        .get(usize::from(addr))
        .copied()
        .unwrap_or(ReadHandler::Unmapped)
}

/// Whether reading `addr` returns register content.
pub fn is_readable(addr: u8) -> bool {
    handler(addr) != ReadHandler::Unmapped
}

/// Compute the byte returned for a read of `addr`.
pub fn read_register(addr: u8, state: &DeviceState) -> u8 {
    let control = &state.control;
    let telemetry = &state.telemetry;
    let identity = &state.identity;
    match handler(addr) {
        ReadHandler::Unmapped => UNMAPPED_READ,
        ReadHandler::SourceTypes => encode_source_types(&control.audio),
        ReadHandler::Routing(group) => group.encode(&control.audio),
        ReadHandler::Mute => encode_mute(&control.audio),
        ReadHandler::Standby => u8::from(control.audio.standby),
        ReadHandler::Volume(channel) => control.audio.volume(channel),
        ReadHandler::PowerStatus => telemetry.power.bits(),
        ReadHandler::FanOverride => u8::from(control.fan_override),
        ReadHandler::LedOverride => u8::from(control.led_override),
        ReadHandler::LedValue => control.leds.bits(),
        ReadHandler::Expansion => control.expansion.bits(),
        ReadHandler::Hv1Voltage => telemetry.hv1_voltage,
        ReadHandler::Hv1Temperature => telemetry.hv1_temperature,
        ReadHandler::Amp1Temperature => telemetry.amp1_temperature,
        ReadHandler::Amp2Temperature => telemetry.amp2_temperature,
        ReadHandler::VersionMajor => identity.version_major,
        ReadHandler::VersionMinor => identity.version_minor,
        ReadHandler::GitHash(n) => identity
            .hash_bytes()
            .get(usize::from(n))
            .copied()
            .unwrap_or(UNMAPPED_READ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::BuildIdentity;
    use crate::state::{ExpansionControl, LedValue, PowerGpio};

    fn state() -> DeviceState {
        DeviceState::new(BuildIdentity::new(3, 14, 0x0123_4567, true))
    }

    #[test]
    fn unknown_and_write_only_read_ff() {
        let s = state();
        for addr in [0x15, 0x7E, 0x98, 0xF9] {
            assert_eq!(read_register(addr, &s), 0xFF);
        }
        assert_eq!(read_register(Register::ExternalGpio.address(), &s), 0xFF);
        assert_eq!(read_register(Register::AdcDebug.address(), &s), 0xFF);
        assert!(!is_readable(Register::AdcDebug.address()));
    }

    #[test]
    fn every_readable_register_has_a_handler() {
        for reg in Register::ALL {
            assert_eq!(is_readable(reg.address()), reg.access().readable());
        }
    }

    #[test]
    fn identity_registers() {
        let s = state();
        assert_eq!(read_register(0xFA, &s), 3);
        assert_eq!(read_register(0xFB, &s), 14);
        assert_eq!(read_register(0xFC, &s), 0x12);
        assert_eq!(read_register(0xFD, &s), 0x34);
        assert_eq!(read_register(0xFE, &s), 0x56);
        assert_eq!(read_register(0xFF, &s), 0x71);
    }

    #[test]
    fn power_on_audio_readback() {
        let s = state();
        assert_eq!(read_register(Register::SrcAd.address(), &s), 0);
        assert_eq!(read_register(Register::Ch321.address(), &s), 0);
        assert_eq!(read_register(Register::Mute.address(), &s), 0b0011_1111);
        assert_eq!(read_register(Register::Standby.address(), &s), 1);
        assert_eq!(read_register(Register::VolCh3.address(), &s), 0);
    }

    #[test]
    fn control_and_telemetry_bytes() {
        let mut s = state();
        s.control.fan_override = true;
        s.control.leds = LedValue::POWER | LedValue::ZONE_6;
        s.control.expansion = ExpansionControl::UART_PASSTHROUGH;
        s.telemetry.power = PowerGpio::OVER_TEMP | PowerGpio::PG_12V;
        s.telemetry.amp2_temperature = 0x5A;

        assert_eq!(read_register(Register::PowerStatus.address(), &s), 0b110);
        assert_eq!(read_register(Register::FanCtrl.address(), &s), 1);
        assert_eq!(read_register(Register::LedCtrl.address(), &s), 0);
        assert_eq!(read_register(Register::LedVal.address(), &s), 0x81);
        assert_eq!(read_register(Register::Expansion.address(), &s), 0x04);
        assert_eq!(read_register(Register::Amp2Temp.address(), &s), 0x5A);
    }
}
