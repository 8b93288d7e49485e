//! Bounded cooperative waits on bus flags.
//!
//! The peripheral stretches the clock while a flag is pending, so the
//! servicer has to answer quickly but must never spin forever on a master
//! that walked away. Every wait polls a probe, yields to the executor
//! between polls, and gives up at a deadline or when a [`CancelToken`]
//! fires.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::yield_now;
use embassy_time::{Duration, Instant};

use super::error::{ServiceError, WaitStage};

/// Cooperative cancellation flag, shareable from a `static`.
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    /// A token that has not fired.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Fire the token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Re-arm the token.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Poll `probe` until it yields a value, `timeout` elapses or `cancel` fires.
///
/// The probe is checked once more before each give-up so an event that
/// lands right at the deadline is not lost.
pub async fn poll_until<T>(
    mut probe: impl FnMut() -> Option<T>,
    timeout: Duration,
    cancel: Option<&CancelToken>,
    stage: WaitStage,
) -> Result<T, ServiceError> {
    let deadline = Instant::now()
        .checked_add(timeout)
        .unwrap_or(Instant::MAX);
    loop {
        if let Some(value) = probe() {
            return Ok(value);
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(ServiceError::Cancelled { stage });
        }
        if Instant::now() >= deadline {
            return Err(ServiceError::Timeout { stage });
        }
        yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_probe_returns_immediately() {
        let got = poll_until(|| Some(7u8), Duration::from_millis(1), None, WaitStage::Direction).await;
        assert_eq!(got, Ok(7));
    }

    #[tokio::test]
    async fn test_probe_polled_until_ready() {
        let mut polls = 0u32;
        let got = poll_until(
            || {
                polls = polls.saturating_add(1);
                (polls == 3).then_some(polls)
            },
            Duration::from_secs(1),
            None,
            WaitStage::RegisterByte,
        )
        .await;
        assert_eq!(got, Ok(3));
    }

    #[tokio::test]
    async fn test_silent_probe_times_out() {
        let got = poll_until(
            || None::<()>,
            Duration::from_millis(2),
            None,
            WaitStage::Completion,
        )
        .await;
        assert_eq!(
            got,
            Err(ServiceError::Timeout {
                stage: WaitStage::Completion
            })
        );
    }

    #[tokio::test]
    async fn test_fired_token_cancels() {
        let token = CancelToken::new();
        token.cancel();
        let got = poll_until(
            || None::<()>,
            Duration::from_secs(1),
            Some(&token),
            WaitStage::TransmitReady,
        )
        .await;
        assert_eq!(
            got,
            Err(ServiceError::Cancelled {
                stage: WaitStage::TransmitReady
            })
        );
        token.reset();
        assert!(!token.is_cancelled());
    }
}
