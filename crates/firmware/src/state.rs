//! Device state shared between the register interface and the samplers.
//!
//! [`ControlState`] is only ever written by the register write path.
//! [`Telemetry`] is only ever written by whatever samples the power monitor
//! and the ADC. The servicer reads both through [`SharedState::snapshot`].
//!
//! # Locking
//!
//! The blocking mutex is a critical section on the target. It is held for a
//! struct copy and nothing else: writes copy the control block out, run the
//! (async) actuation on the copy, then [`SharedState::commit_control`] it.

use core::cell::RefCell;

use bitflags::bitflags;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use preamp_platform::{Channel, InputType, Source};

use crate::identity::BuildIdentity;

bitflags! {
    /// Power monitor inputs, laid out as the POWER_STATUS register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PowerGpio: u8 {
        /// Fan tachometer fault (developer units only).
        const FAN_FAIL = 1 << 0;
        /// Over-temperature comparator tripped.
        const OVER_TEMP = 1 << 1;
        /// 12 V rail power-good.
        const PG_12V = 1 << 2;
    }
}

bitflags! {
    /// Front-panel LED latch byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LedValue: u8 {
        /// Green power LED.
        const POWER = 1 << 0;
        /// Red standby LED.
        const STANDBY = 1 << 1;
        /// Zone 1 LED.
        const ZONE_1 = 1 << 2;
        /// Zone 2 LED.
        const ZONE_2 = 1 << 3;
        /// Zone 3 LED.
        const ZONE_3 = 1 << 4;
        /// Zone 4 LED.
        const ZONE_4 = 1 << 5;
        /// Zone 5 LED.
        const ZONE_5 = 1 << 6;
        /// Zone 6 LED.
        const ZONE_6 = 1 << 7;
    }
}

bitflags! {
    /// Expansion-port control byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExpansionControl: u8 {
        /// Drive NRST_OUT high (expansion unit runs).
        const RESET = 1 << 0;
        /// Drive BOOT0_OUT high (expansion unit boots its ROM loader).
        const BOOT0 = 1 << 1;
        /// Forward host UART traffic to expansion units.
        const UART_PASSTHROUGH = 1 << 2;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PowerGpio {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PowerGpio({=u8:#04x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LedValue {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "LedValue({=u8:#04x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ExpansionControl {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ExpansionControl({=u8:#04x})", self.bits());
    }
}

/// Audio path as last configured over the register interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioState {
    inputs: [InputType; Source::COUNT],
    routing: [Source; Channel::COUNT],
    muted: [bool; Channel::COUNT],
    /// Amplifiers in standby.
    pub standby: bool,
    volumes: [u8; Channel::COUNT],
}

impl AudioState {
    /// Power-on audio path: analog inputs, everything on source 0, muted,
    /// in standby, volume 0.
    pub const POWER_ON: AudioState = AudioState {
        inputs: [InputType::Analog; Source::COUNT],
        routing: [Source::from_selector(0); Channel::COUNT],
        muted: [true; Channel::COUNT],
        standby: true,
        volumes: [0; Channel::COUNT],
    };

    /// Input type selected for `source`.
    pub fn input(&self, source: Source) -> InputType {
        self.inputs
            .get(usize::from(source.index()))
            .copied()
            .unwrap_or_default()
    }

    /// Record the input type of `source`.
    pub fn set_input(&mut self, source: Source, input: InputType) {
        if let Some(slot) = self.inputs.get_mut(usize::from(source.index())) {
            *slot = input;
        }
    }

    /// Source routed to `channel`.
    pub fn route(&self, channel: Channel) -> Source {
        self.routing
            .get(usize::from(channel.index()))
            .copied()
            .unwrap_or(Source::from_selector(0))
    }

    /// Record the source routed to `channel`.
    pub fn set_route(&mut self, channel: Channel, source: Source) {
        if let Some(slot) = self.routing.get_mut(usize::from(channel.index())) {
            *slot = source;
        }
    }

    /// Whether `channel` is muted.
    pub fn is_muted(&self, channel: Channel) -> bool {
        self.muted
            .get(usize::from(channel.index()))
            .copied()
            .unwrap_or(true)
    }

    /// Record the mute state of `channel`.
    pub fn set_muted(&mut self, channel: Channel, muted: bool) {
        if let Some(slot) = self.muted.get_mut(usize::from(channel.index())) {
            *slot = muted;
        }
    }

    /// Raw volume byte of `channel`.
    pub fn volume(&self, channel: Channel) -> u8 {
        self.volumes
            .get(usize::from(channel.index()))
            .copied()
            .unwrap_or(0)
    }

    /// Record the volume byte of `channel`.
    pub fn set_volume(&mut self, channel: Channel, value: u8) {
        if let Some(slot) = self.volumes.get_mut(usize::from(channel.index())) {
            *slot = value;
        }
    }
}

impl Default for AudioState {
    fn default() -> Self {
        Self::POWER_ON
    }
}

/// Everything the register write path owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlState {
    /// Audio path.
    pub audio: AudioState,
    /// Fan forced to full speed.
    pub fan_override: bool,
    /// Host controls the front panel LEDs.
    pub led_override: bool,
    /// Last LED byte written by the host.
    pub leds: LedValue,
    /// Expansion-port outputs.
    pub expansion: ExpansionControl,
    /// External GPIO output level.
    pub external_gpio: bool,
}

impl ControlState {
    /// State after reset.
    pub const POWER_ON: ControlState = ControlState {
        audio: AudioState::POWER_ON,
        fan_override: false,
        led_override: false,
        leds: LedValue::empty(),
        expansion: ExpansionControl::empty(),
        external_gpio: false,
    };
}

impl Default for ControlState {
    fn default() -> Self {
        Self::POWER_ON
    }
}

/// Sampled board health. Raw ADC counts, scaled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    /// Power monitor inputs.
    pub power: PowerGpio,
    /// High-voltage rail 1.
    pub hv1_voltage: u8,
    /// High-voltage supply 1 temperature.
    pub hv1_temperature: u8,
    /// Amplifier 1 heatsink temperature.
    pub amp1_temperature: u8,
    /// Amplifier 2 heatsink temperature.
    pub amp2_temperature: u8,
}

impl Telemetry {
    /// Nothing sampled yet.
    pub const ZERO: Telemetry = Telemetry {
        power: PowerGpio::empty(),
        hv1_voltage: 0,
        hv1_temperature: 0,
        amp1_temperature: 0,
        amp2_temperature: 0,
    };
}

/// Complete state visible through the register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    /// Host-controlled outputs.
    pub control: ControlState,
    /// Sampled inputs.
    pub telemetry: Telemetry,
    /// Version and git revision.
    pub identity: BuildIdentity,
}

impl DeviceState {
    /// Power-on state for a given build.
    pub const fn new(identity: BuildIdentity) -> Self {
        Self {
            control: ControlState::POWER_ON,
            telemetry: Telemetry::ZERO,
            identity,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(BuildIdentity::CURRENT)
    }
}

/// [`DeviceState`] behind a critical-section mutex, usable from a `static`.
pub struct SharedState {
    inner: Mutex<CriticalSectionRawMutex, RefCell<DeviceState>>,
}

impl SharedState {
    /// Power-on state for a given build.
    pub const fn new(identity: BuildIdentity) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(DeviceState::new(identity))),
        }
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> DeviceState {
        self.inner.lock(|cell| *cell.borrow())
    }

    /// Copy of the control block, for a write to work on.
    pub fn control(&self) -> ControlState {
        self.inner.lock(|cell| cell.borrow().control)
    }

    /// Replace the control block.
    pub fn commit_control(&self, control: ControlState) {
        self.inner.lock(|cell| cell.borrow_mut().control = control);
    }

    /// Update telemetry in place.
    pub fn update_telemetry(&self, update: impl FnOnce(&mut Telemetry)) {
        self.inner.lock(|cell| update(&mut cell.borrow_mut().telemetry));
    }

    /// Store freshly sampled power monitor inputs.
    pub fn set_power(&self, power: PowerGpio) {
        self.update_telemetry(|t| t.power = power);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(BuildIdentity::CURRENT)
    }
}
