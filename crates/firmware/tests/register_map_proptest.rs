//! Property tests for the register map.
// Integration test file: unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! Run with: cargo test -p preamp-firmware --test register_map_proptest

use embassy_futures::block_on;
use preamp_firmware::ctrl::read_map::{is_readable, read_register};
use preamp_firmware::ctrl::registers::Register;
use preamp_firmware::ctrl::write_map::{is_writable, write_register};
use preamp_firmware::{Board, BuildIdentity, ControlState, DeviceState, WriteEffect};
use preamp_platform::mocks::{MockAudioPath, MockExpansionPort, MockMonitorBus};
use preamp_platform::Channel;
use proptest::prelude::*;

fn board() -> Board<MockAudioPath, MockExpansionPort, MockMonitorBus> {
    Board::new(
        MockAudioPath::new(),
        MockExpansionPort::new(),
        MockMonitorBus::new(),
    )
}

fn unmapped_address() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("mapped register", |a| Register::from_address(*a).is_none())
}

proptest! {
    /// Addresses outside the register table always read 0xFF.
    #[test]
    fn unmapped_reads_ff(addr in unmapped_address(), hash in any::<u32>(), dirty in any::<bool>()) {
        let state = DeviceState::new(BuildIdentity::new(1, 0, hash, dirty));
        prop_assert!(!is_readable(addr));
        prop_assert_eq!(read_register(addr, &state), 0xFF);
    }

    /// Writes to unmapped addresses change nothing and call nothing.
    #[test]
    fn unmapped_writes_do_nothing(addr in unmapped_address(), data in any::<u8>()) {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        let effect = block_on(write_register(addr, data, &mut control, &mut board));

        prop_assert!(!is_writable(addr));
        prop_assert_eq!(effect, WriteEffect::Ignored);
        prop_assert_eq!(control, ControlState::POWER_ON);
        prop_assert!(board.audio.calls().is_empty());
        prop_assert!(board.monitor.writes.is_empty());
        prop_assert_eq!(board.expansion.uart_enable_count + board.expansion.uart_disable_count, 0);
    }

    /// Any volume byte written to VOL_CHn reads back unchanged, and only
    /// that channel moves.
    #[test]
    fn volume_write_reads_back(ch in 0u8..6, value in any::<u8>()) {
        let addr = Register::VolCh1.address() + ch;
        let mut board = board();
        let mut state = DeviceState::new(BuildIdentity::CURRENT);

        block_on(write_register(addr, value, &mut state.control, &mut board));

        prop_assert_eq!(read_register(addr, &state), value);
        for other in Channel::ALL {
            if other.index() != ch {
                prop_assert_eq!(state.control.audio.volume(other), 0);
            }
        }
    }

    /// Writing the same byte twice never actuates the audio path twice.
    #[test]
    fn audio_writes_are_idempotent(reg in 0u8..=0x0A, data in any::<u8>()) {
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        block_on(write_register(reg, data, &mut control, &mut board));
        let after_first = board.audio.calls().len();
        let effect = block_on(write_register(reg, data, &mut control, &mut board));

        prop_assert_eq!(board.audio.calls().len(), after_first);
        prop_assert_eq!(effect, WriteEffect::Unchanged);
    }

    /// Mute, source-type and routing registers read back the meaningful
    /// bits of what was written.
    #[test]
    fn packed_audio_registers_read_back(data in any::<u8>()) {
        let mut board = board();
        let mut state = DeviceState::new(BuildIdentity::CURRENT);

        for (reg, mask) in [(0x00u8, 0x0Fu8), (0x01, 0x3F), (0x02, 0x3F), (0x03, 0x3F)] {
            block_on(write_register(reg, data, &mut state.control, &mut board));
            prop_assert_eq!(read_register(reg, &state), data & mask);
        }
    }

    /// Read-only registers ignore every write.
    #[test]
    fn read_only_registers_ignore_writes(idx in 0usize..11, data in any::<u8>()) {
        let read_only = [0x0Bu8, 0x10, 0x11, 0x12, 0x13, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF];
        let mut board = board();
        let mut control = ControlState::POWER_ON;

        let effect = block_on(write_register(read_only[idx], data, &mut control, &mut board));

        prop_assert_eq!(effect, WriteEffect::Ignored);
        prop_assert_eq!(control, ControlState::POWER_ON);
    }
}
