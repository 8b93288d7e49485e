//! Hardware Abstraction Layer (HAL) for the preamp controller board
//!
//! This crate provides trait-based abstractions for every piece of hardware
//! the control-bus register interface touches, so the protocol core can be
//! developed and tested without the board.
//!
//! # Architecture Layers
//!
//! ```text
//! Register interface (preamp-firmware: servicer, register map)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (I2C1 slave peripheral, I2C2 monitor bus, GPIO, USART2)
//! ```
//!
//! # Abstractions
//!
//! - [`SlaveBus`] - controller-bus slave peripheral (flag observation + byte I/O)
//! - [`AudioPath`] - input type, routing, mute, standby and volume actuation
//! - [`ExpansionPort`] - expansion-unit reset/boot pins and UART passthrough
//! - [`MonitorBus`] - secondary bus to the power monitor, front panel and ADC
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable defmt logging derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio;
pub mod audio_types;
pub mod bus;
pub mod expansion;
pub mod monitor;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main traits
pub use audio::AudioPath;
pub use bus::{BusStatus, SlaveAddress, SlaveBus, SlaveConfig, TransferDirection};
pub use expansion::{ExpansionPort, PinState};
pub use monitor::{MonitorBus, MonitorRegister};

// Re-export domain newtypes
pub use audio_types::{Channel, InputType, OutOfRangeError, Source};
