//! Controller-bus register interface
//!
//! The host (bus master) reads and writes one-byte registers on this unit.
//!
//! - [`registers`]: address map and field codecs
//! - [`read_map`] / [`write_map`]: address → handler tables
//! - [`matcher`]: own-address detection
//! - [`servicer`]: the per-transaction protocol ([`ControlPort`])
//! - [`wait`]: bounded flag waits and [`CancelToken`]

pub mod error;
pub mod matcher;
pub mod read_map;
pub mod registers;
pub mod servicer;
pub mod wait;
pub mod write_map;

pub use error::{ServiceError, WaitStage};
pub use matcher::is_addressed;
pub use read_map::{read_register, ReadHandler, UNMAPPED_READ};
pub use registers::{Access, Register, RoutingGroup};
pub use servicer::{ControlPort, ServiceStats, Transaction};
pub use wait::CancelToken;
pub use write_map::{write_register, WriteEffect, WriteHandler};
