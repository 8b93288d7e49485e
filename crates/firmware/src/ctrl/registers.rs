//! Controller-bus register addresses and field codecs.
//!
//! Every register is one byte wide. Addresses not listed here read as `0xFF`
//! and ignore writes.

use preamp_platform::{Channel, Source};

use crate::state::AudioState;

/// Access class of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    /// Host may only read.
    ReadOnly,
    /// Host may only write.
    WriteOnly,
    /// Host may read and write.
    ReadWrite,
}

impl Access {
    /// Reads return register content.
    pub const fn readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    /// Writes are dispatched.
    pub const fn writable(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

/// Register address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Source input types, bit per source (1 = digital).
    SrcAd = 0x00,
    /// Sources of channels 1..3, two bits each.
    Ch321 = 0x01,
    /// Sources of channels 4..6, two bits each.
    Ch654 = 0x02,
    /// Mute, bit per channel.
    Mute = 0x03,
    /// Standby (write 0) / wake (write nonzero).
    Standby = 0x04,
    /// Channel 1 volume.
    VolCh1 = 0x05,
    /// Channel 2 volume.
    VolCh2 = 0x06,
    /// Channel 3 volume.
    VolCh3 = 0x07,
    /// Channel 4 volume.
    VolCh4 = 0x08,
    /// Channel 5 volume.
    VolCh5 = 0x09,
    /// Channel 6 volume.
    VolCh6 = 0x0A,
    /// Fan fail, over-temperature and 12 V power-good.
    PowerStatus = 0x0B,
    /// Fan full-speed override.
    FanCtrl = 0x0C,
    /// Front-panel LED override.
    LedCtrl = 0x0D,
    /// Front-panel LED byte.
    LedVal = 0x0E,
    /// Expansion-port reset, boot0 and UART passthrough.
    Expansion = 0x0F,
    /// HV1 rail voltage.
    Hv1Voltage = 0x10,
    /// HV1 supply temperature.
    Hv1Temp = 0x11,
    /// Amplifier 1 temperature.
    Amp1Temp = 0x12,
    /// Amplifier 2 temperature.
    Amp2Temp = 0x13,
    /// External GPIO output.
    ExternalGpio = 0x14,
    /// Raw ADC setup byte.
    AdcDebug = 0x99,
    /// Firmware major version.
    VersionMajor = 0xFA,
    /// Firmware minor version.
    VersionMinor = 0xFB,
    /// Hash nibbles 6 and 5.
    GitHash65 = 0xFC,
    /// Hash nibbles 4 and 3.
    GitHash43 = 0xFD,
    /// Hash nibbles 2 and 1.
    GitHash21 = 0xFE,
    /// Hash nibble 0 and the dirty flag.
    GitHash0D = 0xFF,
}

impl Register {
    /// Every register in address order.
    pub const ALL: [Register; 28] = [
        Self::SrcAd,
        Self::Ch321,
        Self::Ch654,
        Self::Mute,
        Self::Standby,
        Self::VolCh1,
        Self::VolCh2,
        Self::VolCh3,
        Self::VolCh4,
        Self::VolCh5,
        Self::VolCh6,
        Self::PowerStatus,
        Self::FanCtrl,
        Self::LedCtrl,
        Self::LedVal,
        Self::Expansion,
        Self::Hv1Voltage,
        Self::Hv1Temp,
        Self::Amp1Temp,
        Self::Amp2Temp,
        Self::ExternalGpio,
        Self::AdcDebug,
        Self::VersionMajor,
        Self::VersionMinor,
        Self::GitHash65,
        Self::GitHash43,
        Self::GitHash21,
        Self::GitHash0D,
    ];

    /// Look up a wire address.
    pub const fn from_address(addr: u8) -> Option<Self> {
        Some(match addr {
            0x00 => Self::SrcAd,
            0x01 => Self::Ch321,
            0x02 => Self::Ch654,
            0x03 => Self::Mute,
            0x04 => Self::Standby,
            0x05 => Self::VolCh1,
            0x06 => Self::VolCh2,
            0x07 => Self::VolCh3,
            0x08 => Self::VolCh4,
            0x09 => Self::VolCh5,
            0x0A => Self::VolCh6,
            0x0B => Self::PowerStatus,
            0x0C => Self::FanCtrl,
            0x0D => Self::LedCtrl,
            0x0E => Self::LedVal,
            0x0F => Self::Expansion,
            0x10 => Self::Hv1Voltage,
            0x11 => Self::Hv1Temp,
            0x12 => Self::Amp1Temp,
            0x13 => Self::Amp2Temp,
            0x14 => Self::ExternalGpio,
            0x99 => Self::AdcDebug,
            0xFA => Self::VersionMajor,
            0xFB => Self::VersionMinor,
            0xFC => Self::GitHash65,
            0xFD => Self::GitHash43,
            0xFE => Self::GitHash21,
            0xFF => Self::GitHash0D,
            _ => return None,
        })
    }

    /// Wire address.
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Access class.
    pub const fn access(self) -> Access {
        match self {
            Self::PowerStatus
            | Self::Hv1Voltage
            | Self::Hv1Temp
            | Self::Amp1Temp
            | Self::Amp2Temp
            | Self::VersionMajor
            | Self::VersionMinor
            | Self::GitHash65
            | Self::GitHash43
            | Self::GitHash21
            | Self::GitHash0D => Access::ReadOnly,
            Self::ExternalGpio | Self::AdcDebug => Access::WriteOnly,
            _ => Access::ReadWrite,
        }
    }

    /// Channel controlled by a `VOL_CHn` register.
    pub const fn volume_channel(self) -> Option<Channel> {
        match self {
            Self::VolCh1 => Some(Channel::ALL[0]),
            Self::VolCh2 => Some(Channel::ALL[1]),
            Self::VolCh3 => Some(Channel::ALL[2]),
            Self::VolCh4 => Some(Channel::ALL[3]),
            Self::VolCh5 => Some(Channel::ALL[4]),
            Self::VolCh6 => Some(Channel::ALL[5]),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = u8;

    fn try_from(addr: u8) -> Result<Self, u8> {
        Self::from_address(addr).ok_or(addr)
    }
}

impl From<Register> for u8 {
    fn from(register: Register) -> u8 {
        register.address()
    }
}

/// One of the two 3-channel routing registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoutingGroup {
    /// `CH321`: channels 1..3.
    Low,
    /// `CH654`: channels 4..6.
    High,
}

impl RoutingGroup {
    /// Channels in field order, lowest bits first.
    pub const fn channels(self) -> [Channel; 3] {
        match self {
            Self::Low => [Channel::ALL[0], Channel::ALL[1], Channel::ALL[2]],
            Self::High => [Channel::ALL[3], Channel::ALL[4], Channel::ALL[5]],
        }
    }

    /// Split a routing byte into `(channel, source)` pairs. Bits 7..6 are
    /// ignored.
    #[allow(clippy::arithmetic_side_effects)] // field < 3, shift <= 4
    pub fn decode(self, data: u8) -> [(Channel, Source); 3] {
        let mut shift = 0;
        self.channels().map(|channel| {
            let source = Source::from_selector(data >> shift);
            shift += 2;
            (channel, source)
        })
    }

    /// Pack the group's routing into a register byte.
    #[allow(clippy::arithmetic_side_effects)] // index < 4, shift <= 4: fits in u8
    pub fn encode(self, audio: &AudioState) -> u8 {
        let mut shift = 0;
        let mut byte = 0u8;
        for channel in self.channels() {
            byte |= audio.route(channel).index() << shift;
            shift += 2;
        }
        byte
    }
}

/// Pack the source input types (bit set = digital).
pub fn encode_source_types(audio: &AudioState) -> u8 {
    Source::ALL
        .iter()
        .filter(|s| audio.input(**s).is_digital())
        .fold(0, |byte, s| byte | s.mask())
}

/// Pack the per-channel mute flags.
pub fn encode_mute(audio: &AudioState) -> u8 {
    Channel::ALL
        .iter()
        .filter(|c| audio.is_muted(**c))
        .fold(0, |byte, c| byte | c.mask())
}

#[cfg(test)]
mod tests {
    use super::*;
    use preamp_platform::InputType;

    #[test]
    fn address_round_trip_is_total_over_table() {
        for reg in Register::ALL {
            assert_eq!(Register::from_address(reg.address()), Some(reg));
            assert_eq!(Register::try_from(u8::from(reg)), Ok(reg));
        }
        assert_eq!(Register::try_from(0x7E), Err(0x7E));
        assert_eq!(Register::from_address(0x15), None);
    }

    #[test]
    fn access_classes() {
        assert_eq!(Register::PowerStatus.access(), Access::ReadOnly);
        assert_eq!(Register::ExternalGpio.access(), Access::WriteOnly);
        assert_eq!(Register::VolCh4.access(), Access::ReadWrite);
        assert!(!Register::GitHash0D.access().writable());
        assert!(!Register::AdcDebug.access().readable());
    }

    #[test]
    fn volume_registers_map_to_channels() {
        assert_eq!(Register::VolCh1.volume_channel(), Some(Channel::ALL[0]));
        assert_eq!(Register::VolCh6.volume_channel(), Some(Channel::ALL[5]));
        assert_eq!(Register::Mute.volume_channel(), None);
    }

    #[test]
    fn routing_decode_reads_two_bit_fields() {
        // ch4 <- src1, ch5 <- src2, ch6 <- src3, top bits ignored
        let pairs = RoutingGroup::High.decode(0b1111_1001);
        assert_eq!(
            pairs,
            [
                (Channel::ALL[3], Source::ALL[1]),
                (Channel::ALL[4], Source::ALL[2]),
                (Channel::ALL[5], Source::ALL[3]),
            ]
        );
    }

    #[test]
    fn routing_encode_inverts_decode_for_valid_bytes() {
        let mut audio = AudioState::POWER_ON;
        for (channel, source) in RoutingGroup::Low.decode(0b0010_0111) {
            audio.set_route(channel, source);
        }
        assert_eq!(RoutingGroup::Low.encode(&audio), 0b0010_0111);
        assert_eq!(RoutingGroup::High.encode(&audio), 0);
    }

    #[test]
    fn source_and_mute_packing() {
        let mut audio = AudioState::POWER_ON;
        assert_eq!(encode_mute(&audio), 0b0011_1111);
        assert_eq!(encode_source_types(&audio), 0);
        audio.set_input(Source::ALL[2], InputType::Digital);
        audio.set_muted(Channel::ALL[0], false);
        assert_eq!(encode_source_types(&audio), 0b0100);
        assert_eq!(encode_mute(&audio), 0b0011_1110);
    }
}
