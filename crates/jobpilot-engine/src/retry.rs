//! Bounded, cancel-aware retry for page interactions.

use crate::error::{EngineError, Result};
use jobpilot_core::CancelToken;
use std::future::Future;
use std::time::Duration;

/// Run `op` up to `attempts` times, `interval` apart, until it yields a
/// value.
///
/// `op` returns `Ok(Some(v))` when done, `Ok(None)` when the condition is
/// not met yet, and `Err` for attempt failures; failures are retried like
/// misses, and the last error (if any) is what an exhausted retry reports.
/// Cancellation is checked before every attempt.
///
/// # Errors
/// `EngineError::Cancelled` on cancellation, `EngineError::RetriesExhausted`
/// (or the last attempt error) when all attempts miss.
pub async fn bounded_retry<T, F, Fut>(
    what: &str,
    attempts: u32,
    interval: Duration,
    cancel: &CancelToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut last_err: Option<EngineError> = None;

    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        match op().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                tracing::debug!("{} not ready (attempt {}/{})", what, attempt, attempts);
            }
            Err(e) => {
                tracing::debug!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                last_err = Some(e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(last_err.unwrap_or_else(|| EngineError::RetriesExhausted(what.to_string())))
}
