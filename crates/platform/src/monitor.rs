//! Secondary (I2C2) monitor bus
//!
//! The preamp is master on a second I2C bus that carries:
//!
//! | Device | 7-bit addr | Role |
//! |--------|-----------|------|
//! | MCP23008 power/temperature monitor | `0x21` | fan-fail, over-temp, 12 V PG inputs; fan full-speed and external GPIO outputs |
//! | MCP23008 front panel | `0x20` | front-panel LEDs |
//! | MAX11601 ADC | `0x64` | HV1 and temperature sampling |
//!
//! The register interface only needs single-byte reads and writes against a
//! handful of fixed device registers, named by [`MonitorRegister`].

/// 7-bit address of the power/temperature monitor expander.
pub const POWER_MONITOR_ADDR: u8 = 0x21;
/// 7-bit address of the front-panel LED expander.
pub const FRONT_PANEL_ADDR: u8 = 0x20;
/// 7-bit address of the ADC.
pub const ADC_ADDR: u8 = 0x64;

/// MCP23008 GPIO register (pin levels).
pub const MCP23008_GPIO: u8 = 0x09;
/// MCP23008 OLAT register (output latches).
pub const MCP23008_OLAT: u8 = 0x0A;

/// Power monitor latch bit: run the fan at full speed.
pub const POWER_LATCH_FAN_FULL: u8 = 1 << 7;
/// Power monitor latch bit: external GPIO output.
pub const POWER_LATCH_EXT_GPIO: u8 = 1 << 6;

/// A single-byte location on the monitor bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorRegister {
    /// Power monitor pin levels.
    PowerGpio,
    /// Power monitor output latches.
    PowerOutputLatch,
    /// Front-panel LED latches.
    FrontPanel,
    /// ADC setup byte (write only; the ADC has no register pointer).
    AdcSetup,
}

impl MonitorRegister {
    /// 7-bit address of the device holding this register.
    #[must_use]
    pub const fn device_address(self) -> u8 {
        match self {
            Self::PowerGpio | Self::PowerOutputLatch => POWER_MONITOR_ADDR,
            Self::FrontPanel => FRONT_PANEL_ADDR,
            Self::AdcSetup => ADC_ADDR,
        }
    }

    /// Device register pointer, or `None` for devices written without one.
    #[must_use]
    pub const fn register(self) -> Option<u8> {
        match self {
            Self::PowerGpio => Some(MCP23008_GPIO),
            Self::PowerOutputLatch | Self::FrontPanel => Some(MCP23008_OLAT),
            Self::AdcSetup => None,
        }
    }
}

/// Byte-oriented access to the monitor bus.
pub trait MonitorBus {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read one byte.
    fn read_byte(
        &mut self,
        register: MonitorRegister,
    ) -> impl core::future::Future<Output = Result<u8, Self::Error>>;

    /// Write one byte.
    fn write_byte(
        &mut self,
        register: MonitorRegister,
        value: u8,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}
