//! Controller-bus configuration
//!
//! Timeouts follow the SMBus clock-low limit: a master that holds the bus
//! for more than 35 ms between bytes is considered stalled and the servicer
//! abandons the transaction instead of spinning forever.

use embassy_time::Duration;
use preamp_platform::SlaveConfig;
use thiserror_no_std::Error;

/// Longest the servicer waits for the next byte-level event of a transaction.
pub const DEFAULT_BYTE_TIMEOUT: Duration = Duration::from_millis(35);

/// Longest the servicer waits for NACK/STOP after the data byte.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_millis(35);

/// Upper bound accepted by [`ControllerConfig::validate`].
pub const MAX_TIMEOUT: Duration = Duration::from_secs(1);

/// Highest digital filter length the peripheral supports.
pub const MAX_DIGITAL_FILTER: u8 = 15;

/// Configuration of the controller-bus slave port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Peripheral setup (own address, filters).
    pub slave: SlaveConfig,
    /// Bound on each wait inside a transaction.
    pub byte_timeout: Duration,
    /// Bound on the final NACK/STOP wait.
    pub completion_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            slave: SlaveConfig::default(),
            byte_timeout: DEFAULT_BYTE_TIMEOUT,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

impl ControllerConfig {
    /// Check the configuration before it is applied to the peripheral.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for timeout in [self.byte_timeout, self.completion_timeout] {
            if timeout == Duration::from_ticks(0) {
                return Err(ConfigError::ZeroTimeout);
            }
            if timeout > MAX_TIMEOUT {
                return Err(ConfigError::TimeoutTooLong {
                    millis: timeout.as_millis(),
                });
            }
        }
        if self.slave.digital_filter > MAX_DIGITAL_FILTER {
            return Err(ConfigError::DigitalFilterTooLong {
                value: self.slave.digital_filter,
            });
        }
        Ok(())
    }
}

/// Rejected [`ControllerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A timeout of zero would fail every transaction.
    #[error("timeout must be non-zero")]
    ZeroTimeout,
    /// A timeout longer than [`MAX_TIMEOUT`].
    #[error("timeout of {millis} ms exceeds the 1 s limit")]
    TimeoutTooLong {
        /// Requested timeout in milliseconds.
        millis: u64,
    },
    /// Digital filter length above [`MAX_DIGITAL_FILTER`].
    #[error("digital filter length {value} exceeds 15")]
    DigitalFilterTooLong {
        /// Requested filter length.
        value: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use preamp_platform::SlaveAddress;

    #[test]
    fn default_is_valid_main_unit() {
        let config = ControllerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.slave.address, SlaveAddress::MAIN_UNIT);
        assert_eq!(config.byte_timeout.as_millis(), 35);
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ControllerConfig {
            completion_timeout: Duration::from_ticks(0),
            ..ControllerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn long_timeout_rejected() {
        let config = ControllerConfig {
            byte_timeout: Duration::from_secs(5),
            ..ControllerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimeoutTooLong { millis: 5000 })
        );
    }

    #[test]
    fn digital_filter_limit() {
        let mut config = ControllerConfig::default();
        config.slave.digital_filter = 15;
        assert_eq!(config.validate(), Ok(()));
        config.slave.digital_filter = 16;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DigitalFilterTooLong { value: 16 })
        );
    }
}
