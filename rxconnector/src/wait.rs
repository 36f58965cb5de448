//! Bounded polling waits.
//!
//! Waits accept timeouts in milliseconds and poll in fixed steps of
//! [`ConnectorConfig::poll_interval`](crate::ConnectorConfig) (5 s by default). A
//! timeout is rounded up to a whole number of steps and never below one step, so
//! a 3000 ms timeout polls at 0 s and 5 s, and a 12000 ms timeout polls at 0, 5,
//! 10 and 15 s.
//!
//! The condition is checked once more at the deadline itself, so a wait of `n`
//! steps evaluates it `n + 1` times. A change that lands in the last step is
//! still seen, and the wait never runs past its rounded timeout.

use crate::errors::AutomationError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Timeout and poll interval of one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSpec {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitSpec {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Quantizes a millisecond timeout to whole `step`s, at least one.
    pub fn from_millis(timeout_ms: u64, step: Duration) -> Self {
        let step_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX).max(1);
        let steps = timeout_ms.div_ceil(step_ms).max(1);
        let steps = u32::try_from(steps).unwrap_or(u32::MAX);
        Self {
            timeout: step.saturating_mul(steps),
            interval: step,
        }
    }
}

/// Evaluates `predicate` until it returns `true` or `spec.timeout` has elapsed.
///
/// The predicate runs immediately and then once after every interval, the last
/// time when the accumulated interval count reaches the timeout. Elapsed time is
/// counted as intervals slept, so a wait that fails has slept exactly the timeout
/// rounded up to the next interval.
///
/// Returns `Ok(false)` on timeout; callers decide whether that is an error. A
/// predicate error ends the wait immediately. Cancelling `cancel` aborts the
/// wait with [`AutomationError::Cancelled`].
pub async fn poll_until<F>(
    spec: WaitSpec,
    cancel: &CancellationToken,
    mut predicate: F,
) -> Result<bool, AutomationError>
where
    F: FnMut() -> Result<bool, AutomationError>,
{
    let mut elapsed = Duration::ZERO;
    loop {
        if cancel.is_cancelled() {
            return Err(AutomationError::Cancelled(format!(
                "cancelled after {elapsed:?}"
            )));
        }
        if predicate()? {
            debug!("wait satisfied after {:?}", elapsed);
            return Ok(true);
        }
        if elapsed >= spec.timeout || spec.interval.is_zero() {
            debug!("wait gave up after {:?}", elapsed);
            return Ok(false);
        }
        tokio::select! {
            _ = tokio::time::sleep(spec.interval) => {}
            _ = cancel.cancelled() => {
                return Err(AutomationError::Cancelled(format!(
                    "cancelled after {elapsed:?}"
                )));
            }
        }
        elapsed += spec.interval;
    }
}
