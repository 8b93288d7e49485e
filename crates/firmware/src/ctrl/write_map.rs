//! Register write dispatch.
//!
//! A 256-entry table from wire address to a [`WriteHandler`]. Handlers work
//! on a caller-owned copy of [`ControlState`] and on the [`Board`]; the
//! caller commits the copy afterwards, so no lock is held while the audio
//! path or the monitor bus is awaited.
//!
//! Audio writes are change-detected per source/channel: repeating a write
//! never re-triggers actuation. Expansion and monitor writes always drive
//! the hardware, which is idempotent on those outputs.

use preamp_platform::monitor::{POWER_LATCH_EXT_GPIO, POWER_LATCH_FAN_FULL};
use preamp_platform::{
    AudioPath, Channel, ExpansionPort, InputType, MonitorBus, MonitorRegister, PinState, Source,
};

use super::registers::{Register, RoutingGroup};
use crate::board::Board;
use crate::log::{debug, trace, warn};
use crate::state::{ControlState, ExpansionControl, LedValue};

/// Outcome of a register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteEffect {
    /// State changed and the hardware was driven.
    Applied,
    /// State already held this value.
    Unchanged,
    /// Unknown address, read-only register or value outside the register's
    /// domain. Nothing was touched.
    Ignored,
    /// A collaborator failed. The state reflects what was actuated before
    /// the failure.
    Failed,
}

impl WriteEffect {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Applied
        } else {
            Self::Unchanged
        }
    }
}

/// What to do with a written byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteHandler {
    /// Unknown address.
    Unmapped,
    /// Known register the host may not write.
    ReadOnly,
    /// Source input types.
    SourceTypes,
    /// One routing group.
    Routing(RoutingGroup),
    /// Mute flags.
    Mute,
    /// Standby / wake.
    Standby,
    /// One channel's volume.
    Volume(Channel),
    /// Fan full-speed override.
    FanOverride,
    /// LED override enable.
    LedOverride,
    /// Front-panel LED byte.
    LedValue,
    /// Expansion control byte.
    Expansion,
    /// External GPIO output.
    ExternalGpio,
    /// Raw ADC setup byte.
    AdcDebug,
}

const fn handler_for(register: Register) -> WriteHandler {
    if !register.access().writable() {
        return WriteHandler::ReadOnly;
    }
    match register {
        Register::SrcAd => WriteHandler::SourceTypes,
        Register::Ch321 => WriteHandler::Routing(RoutingGroup::Low),
        Register::Ch654 => WriteHandler::Routing(RoutingGroup::High),
        Register::Mute => WriteHandler::Mute,
        Register::Standby => WriteHandler::Standby,
        Register::FanCtrl => WriteHandler::FanOverride,
        Register::LedCtrl => WriteHandler::LedOverride,
        Register::LedVal => WriteHandler::LedValue,
        Register::Expansion => WriteHandler::Expansion,
        Register::ExternalGpio => WriteHandler::ExternalGpio,
        Register::AdcDebug => WriteHandler::AdcDebug,
        _ => match register.volume_channel() {
            Some(channel) => WriteHandler::Volume(channel),
            None => WriteHandler::ReadOnly,
        },
    }
}

#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)] // addr < 256
#[allow(clippy::cast_possible_truncation)] // addr < 256
const fn build() -> [WriteHandler; 256] {
    let mut map = [WriteHandler::Unmapped; 256];
    let mut addr = 0usize;
    while addr < 256 {
        if let Some(register) = Register::from_address(addr as u8) {
            map[addr] = handler_for(register);
        }
        addr += 1;
    }
    map
}

/// Write table, indexed by wire address.
pub static WRITE_MAP: [WriteHandler; 256] = build();

/// Handler for a wire address.
pub fn handler(addr: u8) -> WriteHandler {
    WRITE_MAP
        .get(usize::from(addr))
        .copied()
        .unwrap_or(WriteHandler::Unmapped)
}

/// Whether a write to `addr` is dispatched.
pub fn is_writable(addr: u8) -> bool {
    !matches!(handler(addr), WriteHandler::Unmapped | WriteHandler::ReadOnly)
}

/// Apply a host write of `data` to `addr`.
pub async fn write_register<A, X, M>(
    addr: u8,
    data: u8,
    control: &mut ControlState,
    board: &mut Board<A, X, M>,
) -> WriteEffect
where
    A: AudioPath,
    X: ExpansionPort,
    M: MonitorBus,
{
    match handler(addr) {
        WriteHandler::Unmapped => {
            trace!("ctrl: write to unmapped {:#04x} ignored", addr);
            WriteEffect::Ignored
        }
        WriteHandler::ReadOnly => {
            debug!("ctrl: write to read-only {:#04x} ignored", addr);
            WriteEffect::Ignored
        }
        WriteHandler::SourceTypes => source_types(data, control, &mut board.audio).await,
        WriteHandler::Routing(group) => routing(group, data, control, &mut board.audio).await,
        WriteHandler::Mute => mute(data, control, &mut board.audio).await,
        WriteHandler::Standby => standby(data, control, &mut board.audio).await,
        WriteHandler::Volume(channel) => volume(channel, data, control, &mut board.audio).await,
        WriteHandler::FanOverride => match flag(data) {
            Some(on) => {
                let effect =
                    power_latch(POWER_LATCH_FAN_FULL, on, control.fan_override, &mut board.monitor)
                        .await;
                if effect != WriteEffect::Failed {
                    control.fan_override = on;
                }
                effect
            }
            None => WriteEffect::Ignored,
        },
        WriteHandler::ExternalGpio => match flag(data) {
            Some(on) => {
                let effect =
                    power_latch(POWER_LATCH_EXT_GPIO, on, control.external_gpio, &mut board.monitor)
                        .await;
                if effect != WriteEffect::Failed {
                    control.external_gpio = on;
                }
                effect
            }
            None => WriteEffect::Ignored,
        },
        WriteHandler::LedOverride => match flag(data) {
            Some(on) => {
                let changed = control.led_override != on;
                control.led_override = on;
                WriteEffect::from_changed(changed)
            }
            None => WriteEffect::Ignored,
        },
        WriteHandler::LedValue => {
            let leds = LedValue::from_bits_retain(data);
            match board.monitor.write_byte(MonitorRegister::FrontPanel, data).await {
                Ok(()) => {
                    let changed = control.leds != leds;
                    control.leds = leds;
                    WriteEffect::from_changed(changed)
                }
                Err(_) => {
                    warn!("ctrl: front panel write failed");
                    WriteEffect::Failed
                }
            }
        }
        WriteHandler::Expansion => expansion(data, control, &mut board.expansion),
        WriteHandler::AdcDebug => match board.monitor.write_byte(MonitorRegister::AdcSetup, data).await {
            Ok(()) => WriteEffect::Applied,
            Err(_) => {
                warn!("ctrl: ADC setup write failed");
                WriteEffect::Failed
            }
        },
    }
}

/// 0 / 1 registers. Anything else is outside the domain.
fn flag(data: u8) -> Option<bool> {
    match data {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

async fn source_types<A: AudioPath>(data: u8, control: &mut ControlState, audio: &mut A) -> WriteEffect {
    let mut changed = false;
    for source in Source::ALL {
        let input = InputType::from_bit(data & source.mask() != 0);
        if control.audio.input(source) == input {
            continue;
        }
        if audio.configure_input(source, input).await.is_err() {
            warn!("ctrl: input select failed for source {}", source.index());
            return WriteEffect::Failed;
        }
        control.audio.set_input(source, input);
        changed = true;
    }
    WriteEffect::from_changed(changed)
}

async fn routing<A: AudioPath>(
    group: RoutingGroup,
    data: u8,
    control: &mut ControlState,
    audio: &mut A,
) -> WriteEffect {
    let mut changed = false;
    for (channel, source) in group.decode(data) {
        if control.audio.route(channel) == source {
            continue;
        }
        if audio.connect_channel(source, channel).await.is_err() {
            warn!("ctrl: routing failed for channel {}", channel.index());
            return WriteEffect::Failed;
        }
        control.audio.set_route(channel, source);
        changed = true;
    }
    WriteEffect::from_changed(changed)
}

async fn mute<A: AudioPath>(data: u8, control: &mut ControlState, audio: &mut A) -> WriteEffect {
    let mut changed = false;
    for channel in Channel::ALL {
        let muted = data & channel.mask() != 0;
        if control.audio.is_muted(channel) == muted {
            continue;
        }
        if audio.set_mute(channel, muted).await.is_err() {
            warn!("ctrl: mute failed for channel {}", channel.index());
            return WriteEffect::Failed;
        }
        control.audio.set_muted(channel, muted);
        changed = true;
    }
    WriteEffect::from_changed(changed)
}

async fn standby<A: AudioPath>(data: u8, control: &mut ControlState, audio: &mut A) -> WriteEffect {
    let enter = data == 0;
    if control.audio.standby == enter {
        return WriteEffect::Unchanged;
    }
    let result = if enter {
        audio.standby().await
    } else {
        audio.unstandby().await
    };
    if result.is_err() {
        warn!("ctrl: standby transition failed");
        return WriteEffect::Failed;
    }
    control.audio.standby = enter;
    WriteEffect::Applied
}

async fn volume<A: AudioPath>(
    channel: Channel,
    data: u8,
    control: &mut ControlState,
    audio: &mut A,
) -> WriteEffect {
    if control.audio.volume(channel) == data {
        return WriteEffect::Unchanged;
    }
    if audio.set_volume(channel, data).await.is_err() {
        warn!("ctrl: volume failed for channel {}", channel.index());
        return WriteEffect::Failed;
    }
    control.audio.set_volume(channel, data);
    WriteEffect::Applied
}

/// Read-modify-write one output bit of the power monitor. The current pin
/// levels are the base so a latch bit the host never touched keeps
/// following its pin.
async fn power_latch<M: MonitorBus>(mask: u8, on: bool, was: bool, monitor: &mut M) -> WriteEffect {
    let Ok(pins) = monitor.read_byte(MonitorRegister::PowerGpio).await else {
        warn!("ctrl: power monitor read failed");
        return WriteEffect::Failed;
    };
    let latch = if on { pins | mask } else { pins & !mask };
    if monitor
        .write_byte(MonitorRegister::PowerOutputLatch, latch)
        .await
        .is_err()
    {
        warn!("ctrl: power monitor write failed");
        return WriteEffect::Failed;
    }
    WriteEffect::from_changed(was != on)
}

/// Drive the expansion outputs in bit order. Each output that was driven is
/// recorded, so a failure partway leaves the state matching the pins.
fn expansion<X: ExpansionPort>(data: u8, control: &mut ControlState, port: &mut X) -> WriteEffect {
    let requested = ExpansionControl::from_bits_truncate(data);
    let before = control.expansion;
    for flag in [
        ExpansionControl::RESET,
        ExpansionControl::BOOT0,
        ExpansionControl::UART_PASSTHROUGH,
    ] {
        let on = requested.contains(flag);
        let driven = if flag == ExpansionControl::RESET {
            port.set_reset(PinState::from(on))
        } else if flag == ExpansionControl::BOOT0 {
            port.set_boot(PinState::from(on))
        } else {
            port.set_uart_passthrough(on)
        };
        if driven.is_err() {
            warn!("ctrl: expansion port write failed at bit {:#04x}", flag.bits());
            return WriteEffect::Failed;
        }
        control.expansion.set(flag, on);
    }
    WriteEffect::from_changed(control.expansion != before)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use preamp_platform::mocks::{
        AudioCall, MockAudioPath, MockExpansionPort, MockMonitorBus,
    };

    type MockBoard = Board<MockAudioPath, MockExpansionPort, MockMonitorBus>;

    fn board() -> MockBoard {
        Board::new(MockAudioPath::new(), MockExpansionPort::new(), MockMonitorBus::new())
    }

    #[test]
    fn table_classifies_every_register() {
        for reg in Register::ALL {
            assert_eq!(is_writable(reg.address()), reg.access().writable());
        }
        assert_eq!(handler(0x7E), WriteHandler::Unmapped);
        assert_eq!(handler(0xFA), WriteHandler::ReadOnly);
        assert_eq!(handler(0x07), WriteHandler::Volume(Channel::ALL[2]));
    }

    #[tokio::test]
    async fn test_volume_write_actuates_once() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        let effect = write_register(0x07, 0x28, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Applied);
        let effect = write_register(0x07, 0x28, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Unchanged);

        assert_eq!(
            board.audio.calls(),
            &[AudioCall::SetVolume(Channel::ALL[2], 0x28)]
        );
        assert_eq!(control.audio.volume(Channel::ALL[2]), 0x28);
    }

    #[tokio::test]
    async fn test_source_types_only_touch_changed_sources() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        write_register(0x00, 0b0101, &mut control, &mut board).await;
        assert_eq!(
            board.audio.calls(),
            &[
                AudioCall::ConfigureInput(Source::ALL[0], InputType::Digital),
                AudioCall::ConfigureInput(Source::ALL[2], InputType::Digital),
            ]
        );

        board.audio.clear();
        write_register(0x00, 0b0100, &mut control, &mut board).await;
        assert_eq!(
            board.audio.calls(),
            &[AudioCall::ConfigureInput(Source::ALL[0], InputType::Analog)]
        );
    }

    #[tokio::test]
    async fn test_routing_high_group() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        // ch4 stays on src0, ch5 <- src3, ch6 <- src1
        let effect = write_register(0x02, 0b01_11_00, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Applied);
        assert_eq!(
            board.audio.calls(),
            &[
                AudioCall::ConnectChannel(Source::ALL[3], Channel::ALL[4]),
                AudioCall::ConnectChannel(Source::ALL[1], Channel::ALL[5]),
            ]
        );
    }

    #[tokio::test]
    async fn test_mute_ignores_top_bits() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        // all channels already muted; top bits set but meaningless
        let effect = write_register(0x03, 0xFF, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Unchanged);
        assert!(board.audio.calls().is_empty());

        write_register(0x03, 0b1111_1110, &mut control, &mut board).await;
        assert_eq!(board.audio.calls(), &[AudioCall::SetMute(Channel::ALL[0], false)]);
    }

    #[tokio::test]
    async fn test_standby_transitions_are_edge_triggered() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        assert_eq!(write_register(0x04, 0, &mut control, &mut board).await, WriteEffect::Unchanged);
        assert_eq!(write_register(0x04, 7, &mut control, &mut board).await, WriteEffect::Applied);
        assert_eq!(write_register(0x04, 1, &mut control, &mut board).await, WriteEffect::Unchanged);
        assert_eq!(write_register(0x04, 0, &mut control, &mut board).await, WriteEffect::Applied);
        assert_eq!(board.audio.calls(), &[AudioCall::Unstandby, AudioCall::Standby]);
    }

    #[tokio::test]
    async fn test_audio_failure_keeps_partial_progress() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;
        board.audio.fail_after(1);

        let effect = write_register(0x03, 0x00, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Failed);
        assert!(!control.audio.is_muted(Channel::ALL[0]));
        assert!(control.audio.is_muted(Channel::ALL[1]));
    }

    #[tokio::test]
    async fn test_fan_override_read_modify_write() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;
        board.monitor.power_gpio = 0b0000_0101;

        let effect = write_register(0x0C, 1, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Applied);
        assert!(control.fan_override);
        assert_eq!(
            board.monitor.writes,
            vec![(MonitorRegister::PowerOutputLatch, 0b1000_0101)]
        );

        write_register(0x0C, 0, &mut control, &mut board).await;
        assert!(!control.fan_override);
        assert_eq!(board.monitor.power_latch, 0b0000_0101);
    }

    #[tokio::test]
    async fn test_flag_registers_reject_values_above_one() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        for addr in [0x0C, 0x0D, 0x14] {
            assert_eq!(write_register(addr, 2, &mut control, &mut board).await, WriteEffect::Ignored);
        }
        assert!(board.monitor.writes.is_empty());
        assert_eq!(control, ControlState::POWER_ON);
    }

    #[tokio::test]
    async fn test_monitor_failure_leaves_flag() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;
        board.monitor.fail = true;

        assert_eq!(write_register(0x14, 1, &mut control, &mut board).await, WriteEffect::Failed);
        assert!(!control.external_gpio);
        assert_eq!(write_register(0x0E, 0x03, &mut control, &mut board).await, WriteEffect::Failed);
        assert!(control.leds.is_empty());
    }

    #[tokio::test]
    async fn test_external_gpio_sets_bit_6() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        write_register(0x14, 1, &mut control, &mut board).await;
        assert!(control.external_gpio);
        assert_eq!(board.monitor.power_latch, POWER_LATCH_EXT_GPIO);
    }

    #[tokio::test]
    async fn test_led_value_pushed_to_front_panel() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        assert_eq!(write_register(0x0D, 1, &mut control, &mut board).await, WriteEffect::Applied);
        assert!(control.led_override);
        assert_eq!(write_register(0x0E, 0x81, &mut control, &mut board).await, WriteEffect::Applied);
        assert_eq!(board.monitor.front_panel, 0x81);
        assert_eq!(control.leds, LedValue::POWER | LedValue::ZONE_6);
    }

    #[tokio::test]
    async fn test_expansion_failure_keeps_driven_bits() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;
        board.expansion.fail_after(1);

        let effect = write_register(0x0F, 0b0111, &mut control, &mut board).await;

        assert_eq!(effect, WriteEffect::Failed);
        assert_eq!(board.expansion.reset, PinState::High);
        assert_eq!(board.expansion.boot, PinState::Low);
        assert!(!board.expansion.uart_passthrough);
        assert_eq!(control.expansion, ExpansionControl::RESET);
    }

    #[tokio::test]
    async fn test_expansion_drives_all_outputs() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        let effect = write_register(0x0F, 0b1111_0111, &mut control, &mut board).await;
        assert_eq!(effect, WriteEffect::Applied);
        assert_eq!(board.expansion.reset, PinState::High);
        assert_eq!(board.expansion.boot, PinState::High);
        assert!(board.expansion.uart_passthrough);
        assert_eq!(control.expansion.bits(), 0b0111);

        write_register(0x0F, 0b0000_0001, &mut control, &mut board).await;
        assert_eq!(board.expansion.boot, PinState::Low);
        assert!(!board.expansion.uart_passthrough);
        assert_eq!(board.expansion.uart_disable_count, 1);
    }

    #[tokio::test]
    async fn test_adc_debug_raw_write() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        assert_eq!(write_register(0x99, 0xD2, &mut control, &mut board).await, WriteEffect::Applied);
        assert_eq!(board.monitor.adc_setup, 0xD2);
        assert_eq!(control, ControlState::POWER_ON);
    }

    #[tokio::test]
    async fn test_read_only_write_is_ignored() {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        for addr in [0x0B, 0x10, 0xFA, 0xFF] {
            assert_eq!(write_register(addr, 0x55, &mut control, &mut board).await, WriteEffect::Ignored);
        }
        assert!(board.audio.calls().is_empty());
        assert!(board.monitor.writes.is_empty());
    }
}
