//! Bounded retry for device reads.
//!
//! The bridge never retries on its own; callers that want "read once more,
//! then fall back" wrap the call here.

use std::future::Future;

use tracing::debug;

use crate::Result;

/// Run `op` up to `attempts` times (at least once). The closure receives the
/// 1-based attempt number. An `Ok(None)` (reply without a usable value) and a
/// retryable error both count as a failed attempt.
/// Exhaustion yields `Ok(None)` so the caller applies its default; errors
/// that are not retryable still propagate.
pub async fn retry_value<T, F, Fut>(attempts: usize, mut op: F) -> Result<Option<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => debug!(attempt, attempts, "device call returned no value"),
            Err(e) if e.is_retryable() => {
                debug!(attempt, attempts, error = %e, "device call failed");
            },
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
