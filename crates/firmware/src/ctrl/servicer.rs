//! Slave-side transaction servicer.
//!
//! One transaction, as the host drives it:
//!
//! ```text
//! write:   S addr+W  reg  data  P
//! read:    S addr+W  reg  Sr addr+R  [byte]  NACK P
//! pointer: S addr+W  reg  P
//! probe:   S addr+W  P
//! ```
//!
//! Each step waits on the peripheral flags with a deadline, so a master
//! that stalls mid-transaction costs at most one timeout, never the loop.
//! Only one data byte is moved per transaction. Longer reads are padded
//! with `0xFF`; longer writes are NACKed and dropped. Any failed
//! transaction ends with [`SlaveBus::recover`], so the port is listening
//! for the next START whatever state the host left it in.

use embassy_futures::yield_now;
use preamp_platform::{AudioPath, BusStatus, ExpansionPort, MonitorBus, SlaveBus, TransferDirection};

use super::error::{ServiceError, WaitStage};
use super::matcher;
use super::read_map::{read_register, UNMAPPED_READ};
use super::wait::{poll_until, CancelToken};
use super::write_map::{write_register, WriteEffect};
use crate::board::Board;
use crate::config::ControllerConfig;
use crate::log::{debug, info, trace, warn};
use crate::state::SharedState;

/// A transaction that completed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transaction {
    /// Address only: the host is scanning the bus.
    Probe,
    /// Register byte only, no data phase.
    Pointer {
        /// Register byte sent.
        register: u8,
    },
    /// Single-byte register read.
    Read {
        /// Register read.
        register: u8,
        /// Byte transmitted.
        value: u8,
    },
    /// Single-byte register write.
    Write {
        /// Register written.
        register: u8,
        /// Byte received.
        value: u8,
        /// What the write did.
        effect: WriteEffect,
    },
}

/// Counters kept by [`ControlPort::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceStats {
    /// Transactions that completed.
    pub completed: u32,
    /// Transactions that ended in a [`ServiceError`].
    pub failed: u32,
}

/// What ended the direction wait.
enum Phase {
    Data,
    RepeatedStart(TransferDirection),
    Stop,
}

/// Controller-bus slave port.
pub struct ControlPort<B> {
    bus: B,
    config: ControllerConfig,
}

impl<B: SlaveBus> ControlPort<B> {
    /// Wrap a configured and enabled slave peripheral.
    pub fn new(bus: B, config: ControllerConfig) -> Self {
        info!(
            "ctrl: slave at {:#04x}, byte timeout {} ms",
            config.slave.address.get(),
            config.byte_timeout.as_millis()
        );
        Self { bus, config }
    }

    /// The peripheral.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// The peripheral, mutably.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// The active configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Release the peripheral.
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Service one transaction if the host has addressed us.
    pub async fn poll<A, X, M>(
        &mut self,
        state: &SharedState,
        board: &mut Board<A, X, M>,
    ) -> Option<Result<Transaction, ServiceError>>
    where
        A: AudioPath,
        X: ExpansionPort,
        M: MonitorBus,
    {
        if matcher::is_addressed(&self.bus) {
            Some(self.service(state, board).await)
        } else {
            None
        }
    }

    /// Service the pending transaction. Call only after an address match.
    pub async fn service<A, X, M>(
        &mut self,
        state: &SharedState,
        board: &mut Board<A, X, M>,
    ) -> Result<Transaction, ServiceError>
    where
        A: AudioPath,
        X: ExpansionPort,
        M: MonitorBus,
    {
        self.transact(state, board, None).await
    }

    /// Service transactions until `cancel` fires.
    ///
    /// A transaction in flight when the token fires is abandoned with
    /// [`ServiceError::Cancelled`].
    pub async fn run<A, X, M>(
        &mut self,
        state: &SharedState,
        board: &mut Board<A, X, M>,
        cancel: &CancelToken,
    ) -> ServiceStats
    where
        A: AudioPath,
        X: ExpansionPort,
        M: MonitorBus,
    {
        let mut stats = ServiceStats::default();
        while !cancel.is_cancelled() {
            if !matcher::is_addressed(&self.bus) {
                yield_now().await;
                continue;
            }
            match self.transact(state, board, Some(cancel)).await {
                Ok(_) => stats.completed = stats.completed.saturating_add(1),
                Err(_) => stats.failed = stats.failed.saturating_add(1),
            }
        }
        info!(
            "ctrl: stopped after {} transactions ({} failed)",
            stats.completed,
            stats.failed
        );
        stats
    }

    async fn transact<A, X, M>(
        &mut self,
        state: &SharedState,
        board: &mut Board<A, X, M>,
        cancel: Option<&CancelToken>,
    ) -> Result<Transaction, ServiceError>
    where
        A: AudioPath,
        X: ExpansionPort,
        M: MonitorBus,
    {
        let result = self.transact_inner(state, board, cancel).await;
        match &result {
            Ok(Transaction::Read { register, value }) => {
                debug!("ctrl: read {:#04x} -> {:#04x}", register, value);
            }
            Ok(Transaction::Write { register, value, .. }) => {
                debug!("ctrl: write {:#04x} <- {:#04x}", register, value);
            }
            Ok(Transaction::Pointer { register }) => {
                trace!("ctrl: pointer {:#04x}", register);
            }
            Ok(Transaction::Probe) => trace!("ctrl: probe"),
            Err(err) => {
                warn!("ctrl: {}", err);
                // Leftover RXNE/STOP/NACK would hold the clock and hide the
                // next address match.
                self.bus.recover();
            }
        }
        result
    }

    async fn transact_inner<A, X, M>(
        &mut self,
        state: &SharedState,
        board: &mut Board<A, X, M>,
        cancel: Option<&CancelToken>,
    ) -> Result<Transaction, ServiceError>
    where
        A: AudioPath,
        X: ExpansionPort,
        M: MonitorBus,
    {
        let direction = self.bus.direction();
        self.bus.acknowledge_address();

        if direction == TransferDirection::Read {
            self.pad_read(cancel).await?;
            return Err(ServiceError::MissingRegister);
        }

        // Register byte, or STOP for a bare probe.
        let got_byte = self
            .wait(WaitStage::RegisterByte, cancel, |s| {
                if s.contains(BusStatus::RX_NOT_EMPTY) {
                    Some(true)
                } else if s.contains(BusStatus::STOP) {
                    Some(false)
                } else {
                    None
                }
            })
            .await?;
        if !got_byte {
            self.bus.clear_stop();
            return Ok(Transaction::Probe);
        }
        let register = self.bus.receive_byte();

        loop {
            let phase = self
                .wait(WaitStage::Direction, cancel, |s| {
                    if s.contains(BusStatus::RX_NOT_EMPTY) {
                        Some(Phase::Data)
                    } else if s.contains(BusStatus::ADDRESS_MATCH) {
                        Some(Phase::RepeatedStart(if s.contains(BusStatus::DIR_READ) {
                            TransferDirection::Read
                        } else {
                            TransferDirection::Write
                        }))
                    } else if s.contains(BusStatus::STOP) {
                        Some(Phase::Stop)
                    } else {
                        None
                    }
                })
                .await?;
            match phase {
                Phase::Data => return self.finish_write(register, state, board, cancel).await,
                Phase::RepeatedStart(TransferDirection::Read) => {
                    return self.finish_read(register, state, cancel).await;
                }
                Phase::RepeatedStart(TransferDirection::Write) => {
                    // Sr addr+W: the host re-sent the address, keep waiting.
                    self.bus.acknowledge_address();
                }
                Phase::Stop => {
                    self.bus.clear_stop();
                    return Ok(Transaction::Pointer { register });
                }
            }
        }
    }

    async fn finish_read(
        &mut self,
        register: u8,
        state: &SharedState,
        cancel: Option<&CancelToken>,
    ) -> Result<Transaction, ServiceError> {
        self.bus.acknowledge_address();

        let ready = self
            .wait(WaitStage::TransmitReady, cancel, |s| {
                if s.contains(BusStatus::TX_REQUEST) {
                    Some(true)
                } else if s.contains(BusStatus::STOP) {
                    Some(false)
                } else {
                    None
                }
            })
            .await?;
        if !ready {
            self.bus.clear_stop();
            return Ok(Transaction::Pointer { register });
        }

        let snapshot = state.snapshot();
        let value = read_register(register, &snapshot);
        self.bus.transmit_byte(value);

        let extra = self.pad_read(cancel).await?;
        if extra > 0 {
            return Err(ServiceError::ExtraBytes {
                register,
                count: extra,
            });
        }
        Ok(Transaction::Read { register, value })
    }

    async fn finish_write<A, X, M>(
        &mut self,
        register: u8,
        state: &SharedState,
        board: &mut Board<A, X, M>,
        cancel: Option<&CancelToken>,
    ) -> Result<Transaction, ServiceError>
    where
        A: AudioPath,
        X: ExpansionPort,
        M: MonitorBus,
    {
        let value = self.bus.receive_byte();

        let mut extra = 0usize;
        loop {
            let more = self
                .wait_completion(cancel, |s| {
                    if s.contains(BusStatus::RX_NOT_EMPTY) {
                        Some(true)
                    } else if s.contains(BusStatus::STOP) {
                        Some(false)
                    } else {
                        None
                    }
                })
                .await?;
            if !more {
                self.bus.clear_stop();
                break;
            }
            if extra == 0 {
                self.bus.nack_next();
            }
            let _ = self.bus.receive_byte();
            extra = extra.saturating_add(1);
        }
        if extra > 0 {
            return Err(ServiceError::ExtraBytes {
                register,
                count: extra,
            });
        }

        let mut control = state.control();
        let effect = write_register(register, value, &mut control, board).await;
        if matches!(effect, WriteEffect::Applied | WriteEffect::Failed) {
            state.commit_control(control);
        }
        Ok(Transaction::Write {
            register,
            value,
            effect,
        })
    }

    /// Answer every further transmit request with `0xFF` until the host
    /// ends the read. Returns the number of padding bytes sent.
    async fn pad_read(&mut self, cancel: Option<&CancelToken>) -> Result<usize, ServiceError> {
        let mut padded = 0usize;
        loop {
            let status = self
                .wait_completion(cancel, |s| {
                    s.intersects(BusStatus::TX_REQUEST | BusStatus::NACK | BusStatus::STOP)
                        .then_some(s)
                })
                .await?;
            if status.contains(BusStatus::TX_REQUEST) {
                self.bus.transmit_byte(UNMAPPED_READ);
                padded = padded.saturating_add(1);
            } else if status.contains(BusStatus::NACK) {
                self.bus.clear_nack();
            } else {
                self.bus.clear_stop();
                return Ok(padded);
            }
        }
    }

    async fn wait<T>(
        &self,
        stage: WaitStage,
        cancel: Option<&CancelToken>,
        mut ready: impl FnMut(BusStatus) -> Option<T>,
    ) -> Result<T, ServiceError> {
        let bus = &self.bus;
        poll_until(|| ready(bus.status()), self.config.byte_timeout, cancel, stage).await
    }

    async fn wait_completion<T>(
        &self,
        cancel: Option<&CancelToken>,
        mut ready: impl FnMut(BusStatus) -> Option<T>,
    ) -> Result<T, ServiceError> {
        let bus = &self.bus;
        poll_until(
            || ready(bus.status()),
            self.config.completion_timeout,
            cancel,
            WaitStage::Completion,
        )
        .await
    }
}
