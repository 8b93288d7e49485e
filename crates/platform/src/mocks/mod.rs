//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests. Every mock records what was asked
//! of it so tests can assert on the exact actuation sequence.

#![cfg(any(test, feature = "std"))]

use std::collections::VecDeque;
use std::vec::Vec;

use crate::*;

// ── Slave bus ───────────────────────────────────────────────────────────────

/// One bus event as the slave peripheral would flag it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// (Repeated) START + own address in the given direction.
    Address(TransferDirection),
    /// Master wrote a data byte.
    Byte(u8),
    /// Master clocks out one byte from the slave.
    ReadRequest,
    /// Master NACKed the last byte it read.
    Nack,
    /// STOP condition.
    Stop,
}

/// Scripted slave peripheral.
///
/// The host side of every transaction is queued up front with the
/// `host_*` helpers. [`SlaveBus::status`] reports the flags of the event at
/// the head of the queue; the acknowledge/receive/transmit/clear calls
/// consume it the way the real peripheral clears its flags. An empty queue
/// reports no flags at all, which is what a stalled master looks like.
///
/// After [`SlaveBus::recover`] the peripheral is off the bus until the next
/// START: queued events up to the next address are dropped, and events
/// pushed before one arrives are never seen.
#[derive(Debug, Default)]
pub struct MockSlaveBus {
    script: VecDeque<HostEvent>,
    transmitted: Vec<u8>,
    received: Vec<u8>,
    acknowledged: usize,
    nacked: usize,
    recovered: usize,
    detached: bool,
    dropped: usize,
}

impl MockSlaveBus {
    /// Create an idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw event.
    pub fn push(&mut self, event: HostEvent) -> &mut Self {
        if self.detached && !matches!(event, HostEvent::Address(_)) {
            self.dropped = self.dropped.saturating_add(1);
            return self;
        }
        self.detached = false;
        self.script.push_back(event);
        self
    }

    /// Queue a single-byte register write: `S addr+W reg data P`.
    pub fn host_write(&mut self, register: u8, data: u8) -> &mut Self {
        self.host_write_burst(register, &[data])
    }

    /// Queue a register write with any number of data bytes.
    pub fn host_write_burst(&mut self, register: u8, data: &[u8]) -> &mut Self {
        self.push(HostEvent::Address(TransferDirection::Write));
        self.push(HostEvent::Byte(register));
        for byte in data {
            self.push(HostEvent::Byte(*byte));
        }
        self.push(HostEvent::Stop)
    }

    /// Queue a single-byte register read: `S addr+W reg Sr addr+R [byte] NACK P`.
    pub fn host_read(&mut self, register: u8) -> &mut Self {
        self.host_read_burst(register, 1)
    }

    /// Queue a register read that clocks out `count` bytes.
    pub fn host_read_burst(&mut self, register: u8, count: usize) -> &mut Self {
        self.push(HostEvent::Address(TransferDirection::Write));
        self.push(HostEvent::Byte(register));
        self.push(HostEvent::Address(TransferDirection::Read));
        for _ in 0..count {
            self.push(HostEvent::ReadRequest);
        }
        self.push(HostEvent::Nack);
        self.push(HostEvent::Stop)
    }

    /// Queue an address-only transfer (bus scan / quick command).
    pub fn host_probe(&mut self) -> &mut Self {
        self.push(HostEvent::Address(TransferDirection::Write));
        self.push(HostEvent::Stop)
    }

    /// Bytes transmitted to the master, oldest first.
    pub fn transmitted(&self) -> &[u8] {
        &self.transmitted
    }

    /// Bytes taken from the receive register, oldest first.
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Number of acknowledged address matches.
    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }

    /// Number of [`SlaveBus::nack_next`] calls.
    pub fn nacked(&self) -> usize {
        self.nacked
    }

    /// Number of [`SlaveBus::recover`] calls.
    pub fn recovered(&self) -> usize {
        self.recovered
    }

    /// Events discarded by recovery.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Events not yet consumed by the slave.
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    fn pop_if(&mut self, matches: impl FnOnce(&HostEvent) -> bool) -> Option<HostEvent> {
        if self.script.front().is_some_and(matches) {
            self.script.pop_front()
        } else {
            None
        }
    }
}

impl SlaveBus for MockSlaveBus {
    fn status(&self) -> BusStatus {
        match self.script.front() {
            None => BusStatus::empty(),
            Some(HostEvent::Address(TransferDirection::Write)) => BusStatus::ADDRESS_MATCH,
            Some(HostEvent::Address(TransferDirection::Read)) => {
                BusStatus::ADDRESS_MATCH | BusStatus::DIR_READ
            }
            Some(HostEvent::Byte(_)) => BusStatus::RX_NOT_EMPTY,
            Some(HostEvent::ReadRequest) => BusStatus::TX_REQUEST | BusStatus::DIR_READ,
            Some(HostEvent::Nack) => BusStatus::NACK | BusStatus::DIR_READ,
            Some(HostEvent::Stop) => BusStatus::STOP,
        }
    }

    fn acknowledge_address(&mut self) {
        if self
            .pop_if(|e| matches!(e, HostEvent::Address(_)))
            .is_some()
        {
            self.acknowledged = self.acknowledged.saturating_add(1);
        }
    }

    fn receive_byte(&mut self) -> u8 {
        match self.pop_if(|e| matches!(e, HostEvent::Byte(_))) {
            Some(HostEvent::Byte(byte)) => {
                self.received.push(byte);
                byte
            }
            _ => 0,
        }
    }

    fn transmit_byte(&mut self, byte: u8) {
        self.transmitted.push(byte);
        let _ = self.pop_if(|e| matches!(e, HostEvent::ReadRequest));
    }

    fn clear_stop(&mut self) {
        let _ = self.pop_if(|e| matches!(e, HostEvent::Stop));
    }

    fn clear_nack(&mut self) {
        let _ = self.pop_if(|e| matches!(e, HostEvent::Nack));
    }

    fn nack_next(&mut self) {
        self.nacked = self.nacked.saturating_add(1);
    }

    fn recover(&mut self) {
        self.recovered = self.recovered.saturating_add(1);
        while let Some(event) = self.script.front() {
            if matches!(event, HostEvent::Address(_)) {
                return;
            }
            let _ = self.script.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        self.detached = true;
    }
}

// ── Audio path ──────────────────────────────────────────────────────────────

/// One recorded [`AudioPath`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    /// `configure_input(source, input)`
    ConfigureInput(Source, InputType),
    /// `connect_channel(source, channel)`
    ConnectChannel(Source, Channel),
    /// `set_mute(channel, muted)`
    SetMute(Channel, bool),
    /// `standby()`
    Standby,
    /// `unstandby()`
    Unstandby,
    /// `set_volume(channel, value)`
    SetVolume(Channel, u8),
}

/// Error returned by mocks configured to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockFault;

/// Mock audio path. Records all calls for test assertions.
#[derive(Debug, Default)]
pub struct MockAudioPath {
    calls: Vec<AudioCall>,
    fail_after: Option<usize>,
}

impl MockAudioPath {
    /// Create a mock that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the next `successes` calls, then fail every call after that.
    pub fn fail_after(&mut self, successes: usize) {
        self.fail_after = Some(self.calls.len().saturating_add(successes));
    }

    /// All successful calls, oldest first.
    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    /// Number of successful calls equal to `call`.
    pub fn count(&self, call: AudioCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    /// Forget recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: AudioCall) -> Result<(), MockFault> {
        if self.fail_after.is_some_and(|limit| self.calls.len() >= limit) {
            return Err(MockFault);
        }
        self.calls.push(call);
        Ok(())
    }
}

impl AudioPath for MockAudioPath {
    type Error = MockFault;

    async fn configure_input(&mut self, source: Source, input: InputType) -> Result<(), MockFault> {
        self.record(AudioCall::ConfigureInput(source, input))
    }

    async fn connect_channel(&mut self, source: Source, channel: Channel) -> Result<(), MockFault> {
        self.record(AudioCall::ConnectChannel(source, channel))
    }

    async fn set_mute(&mut self, channel: Channel, muted: bool) -> Result<(), MockFault> {
        self.record(AudioCall::SetMute(channel, muted))
    }

    async fn standby(&mut self) -> Result<(), MockFault> {
        self.record(AudioCall::Standby)
    }

    async fn unstandby(&mut self) -> Result<(), MockFault> {
        self.record(AudioCall::Unstandby)
    }

    async fn set_volume(&mut self, channel: Channel, value: u8) -> Result<(), MockFault> {
        self.record(AudioCall::SetVolume(channel, value))
    }
}

// ── Expansion port ──────────────────────────────────────────────────────────

/// Mock expansion port.
#[derive(Debug, Default)]
pub struct MockExpansionPort {
    /// NRST_OUT level.
    pub reset: PinState,
    /// BOOT0_OUT level.
    pub boot: PinState,
    /// USART2 RX interrupt armed.
    pub uart_passthrough: bool,
    /// Times the passthrough interrupt was armed.
    pub uart_enable_count: usize,
    /// Times the passthrough interrupt was disarmed.
    pub uart_disable_count: usize,
    driven: usize,
    fail_after: Option<usize>,
}

impl MockExpansionPort {
    /// Create a mock with all lines low and passthrough off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the next `successes` calls, then fail every call after that.
    pub fn fail_after(&mut self, successes: usize) {
        self.fail_after = Some(self.driven.saturating_add(successes));
    }

    fn drive(&mut self) -> Result<(), MockFault> {
        if self.fail_after.is_some_and(|limit| self.driven >= limit) {
            return Err(MockFault);
        }
        self.driven = self.driven.saturating_add(1);
        Ok(())
    }
}

impl ExpansionPort for MockExpansionPort {
    type Error = MockFault;

    fn set_reset(&mut self, state: PinState) -> Result<(), MockFault> {
        self.drive()?;
        self.reset = state;
        Ok(())
    }

    fn set_boot(&mut self, state: PinState) -> Result<(), MockFault> {
        self.drive()?;
        self.boot = state;
        Ok(())
    }

    fn set_uart_passthrough(&mut self, enabled: bool) -> Result<(), MockFault> {
        self.drive()?;
        self.uart_passthrough = enabled;
        if enabled {
            self.uart_enable_count = self.uart_enable_count.saturating_add(1);
        } else {
            self.uart_disable_count = self.uart_disable_count.saturating_add(1);
        }
        Ok(())
    }
}

// ── Monitor bus ─────────────────────────────────────────────────────────────

/// Mock monitor bus.
///
/// Writing the power-monitor output latch is reflected on the corresponding
/// output pins of the GPIO register, like the real MCP23008.
#[derive(Debug, Default)]
pub struct MockMonitorBus {
    /// Power monitor pin levels.
    pub power_gpio: u8,
    /// Power monitor output latches.
    pub power_latch: u8,
    /// Front-panel latches.
    pub front_panel: u8,
    /// Last ADC setup byte.
    pub adc_setup: u8,
    /// Every successful write, oldest first.
    pub writes: Vec<(MonitorRegister, u8)>,
    /// Fail every access.
    pub fail: bool,
}

impl MockMonitorBus {
    /// Output pins of the power monitor (fan full-speed, external GPIO).
    pub const POWER_OUTPUTS: u8 = monitor::POWER_LATCH_FAN_FULL | monitor::POWER_LATCH_EXT_GPIO;

    /// Create a mock with every register zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MonitorBus for MockMonitorBus {
    type Error = MockFault;

    async fn read_byte(&mut self, register: MonitorRegister) -> Result<u8, MockFault> {
        if self.fail {
            return Err(MockFault);
        }
        Ok(match register {
            MonitorRegister::PowerGpio => self.power_gpio,
            MonitorRegister::PowerOutputLatch => self.power_latch,
            MonitorRegister::FrontPanel => self.front_panel,
            MonitorRegister::AdcSetup => self.adc_setup,
        })
    }

    async fn write_byte(&mut self, register: MonitorRegister, value: u8) -> Result<(), MockFault> {
        if self.fail {
            return Err(MockFault);
        }
        match register {
            MonitorRegister::PowerGpio => self.power_gpio = value,
            MonitorRegister::PowerOutputLatch => {
                self.power_latch = value;
                self.power_gpio =
                    (self.power_gpio & !Self::POWER_OUTPUTS) | (value & Self::POWER_OUTPUTS);
            }
            MonitorRegister::FrontPanel => self.front_panel = value,
            MonitorRegister::AdcSetup => self.adc_setup = value,
        }
        self.writes.push((register, value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn scripted_write_consumes_in_order() {
        let mut bus = MockSlaveBus::new();
        bus.host_write(0x07, 0x28);

        assert!(bus.is_addressed());
        assert_eq!(bus.direction(), TransferDirection::Write);
        bus.acknowledge_address();
        assert!(bus.is_receive_ready());
        assert_eq!(bus.receive_byte(), 0x07);
        assert_eq!(bus.receive_byte(), 0x28);
        assert!(bus.status().contains(BusStatus::STOP));
        bus.clear_stop();
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.received(), &[0x07, 0x28]);
    }

    #[test]
    fn scripted_read_flags_repeated_start() {
        let mut bus = MockSlaveBus::new();
        bus.host_read(0xFA);
        bus.acknowledge_address();
        bus.receive_byte();
        assert!(bus.is_addressed());
        assert_eq!(bus.direction(), TransferDirection::Read);
        bus.acknowledge_address();
        assert!(bus.is_transmit_ready());
        bus.transmit_byte(0x01);
        assert!(bus.status().contains(BusStatus::NACK));
        assert_eq!(bus.transmitted(), &[0x01]);
        assert_eq!(bus.acknowledged(), 2);
    }

    #[test]
    fn recover_skips_to_next_start() {
        let mut bus = MockSlaveBus::new();
        bus.push(HostEvent::Byte(0x07)).push(HostEvent::Stop);
        bus.host_probe();
        bus.recover();
        assert!(bus.is_addressed());
        assert_eq!(bus.pending(), 2);
        assert_eq!(bus.dropped(), 2);

        // Nothing queued: late bytes of the dead transaction never show up.
        let mut bus = MockSlaveBus::new();
        bus.recover();
        bus.push(HostEvent::Byte(0x28)).push(HostEvent::Stop);
        assert_eq!(bus.status(), BusStatus::empty());
        bus.host_read(0xFA);
        assert!(bus.is_addressed());
        assert_eq!(bus.recovered(), 1);
    }

    #[test]
    fn empty_script_reports_no_flags() {
        let bus = MockSlaveBus::new();
        assert_eq!(bus.status(), BusStatus::empty());
    }

    #[tokio::test]
    async fn test_mock_audio_path_records_and_fails() {
        let mut audio = MockAudioPath::new();
        audio.standby().await.unwrap();
        audio.fail_after(1);
        audio.set_volume(Channel::ALL[2], 0x28).await.unwrap();
        assert_eq!(audio.unstandby().await, Err(MockFault));
        assert_eq!(
            audio.calls(),
            &[AudioCall::Standby, AudioCall::SetVolume(Channel::ALL[2], 0x28)]
        );
    }

    #[tokio::test]
    async fn test_mock_monitor_latch_reflects_on_pins() {
        let mut monitor = MockMonitorBus::new();
        monitor.power_gpio = 0b0000_0101;
        monitor
            .write_byte(MonitorRegister::PowerOutputLatch, 0xFF)
            .await
            .unwrap();
        assert_eq!(
            monitor.read_byte(MonitorRegister::PowerGpio).await.unwrap(),
            0b1100_0101
        );
    }
}
