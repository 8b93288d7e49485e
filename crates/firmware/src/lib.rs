//! Preamp controller firmware: control-bus register interface
//!
//! The preamp board is a slave on the controller bus. The host reads and
//! writes single-byte registers that map onto input selection, routing,
//! mute, standby, volume, fan and LED control, expansion-port control,
//! telemetry and the build identity.
//!
//! # Architecture
//!
//! ```text
//! ControlPort (ctrl::servicer)       one transaction per address match
//!         ↓
//! Register map (ctrl::read_map / ctrl::write_map)
//!         ↓                                   ↓
//! SharedState (state)            Board<AudioPath, ExpansionPort, MonitorBus>
//!         ↓
//! Platform HAL (preamp-platform traits)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the STM32F0 target (defmt over RTT, 32.768 kHz tick)
//! - `defmt-logging` - defmt output through the `defmt-rtt` global logger
//! - `std` - Host builds with the platform mocks
//! - `tracing` - Log through `tracing` instead of defmt
//!
//! # Example
//!
//! ```ignore
//! static STATE: SharedState = SharedState::new(BuildIdentity::CURRENT);
//! static STOP: CancelToken = CancelToken::new();
//!
//! let mut port = ControlPort::new(bus, ControllerConfig::default());
//! let mut board = Board::new(audio, expansion, monitor);
//! port.run(&STATE, &mut board, &STOP).await;
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding the state mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]

pub(crate) mod log;

// Links the RTT transport as defmt's global logger.
#[cfg(feature = "defmt-logging")]
use defmt_rtt as _;

pub mod board;
pub mod config;
pub mod ctrl;
pub mod identity;
pub mod state;

pub use board::Board;
pub use config::{ConfigError, ControllerConfig};
pub use ctrl::{CancelToken, ControlPort, Register, ServiceError, Transaction, WriteEffect};
pub use identity::BuildIdentity;
pub use state::{
    AudioState, ControlState, DeviceState, ExpansionControl, LedValue, PowerGpio, SharedState,
    Telemetry,
};
