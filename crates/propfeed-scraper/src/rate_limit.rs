//! Retry and backoff policy for the fetch client.
//!
//! Transient failures (throttling responses, network-level errors) are
//! retried after a backoff sleep; a server-supplied `Retry-After` takes
//! precedence over the computed schedule. Non-retriable errors (404,
//! other unexpected statuses, invalid URLs) are propagated immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::FetchError;

/// Upper bound on the random jitter added to computed backoff sleeps.
const JITTER_MAX_SECS: f64 = 0.5;

/// Ceiling on any computed backoff sleep. Large retry budgets and
/// aggressive bases must saturate here instead of overflowing
/// `Duration`.
const MAX_BACKOFF_SECS: f64 = 300.0;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
fn is_retriable(err: &FetchError) -> bool {
    matches!(err, FetchError::Throttled { .. } | FetchError::Http(_))
}

/// `backoff_base ^ attempt` seconds, saturated into
/// `[0, MAX_BACKOFF_SECS]` so a degenerate base or a deep attempt index
/// always yields a finite, representable `Duration`.
pub(crate) fn backoff_schedule(backoff_base: f64, attempt: u32) -> Duration {
    let secs = backoff_base
        .powf(f64::from(attempt))
        .min(MAX_BACKOFF_SECS)
        .max(0.0);
    Duration::from_secs_f64(secs)
}

/// Sleep before the retry that follows `attempt` failed attempts.
///
/// A throttling response with a `Retry-After` header is honored verbatim;
/// otherwise the delay follows [`backoff_schedule`] plus up to
/// [`JITTER_MAX_SECS`] of jitter so concurrent callers don't re-dispatch
/// in lockstep.
fn backoff_delay(err: &FetchError, backoff_base: f64, attempt: u32) -> Duration {
    if let FetchError::Throttled {
        retry_after_secs: Some(secs),
        ..
    } = err
    {
        return Duration::from_secs(*secs);
    }
    let jitter = rand::rng().random_range(0.0..JITTER_MAX_SECS);
    backoff_schedule(backoff_base, attempt) + Duration::from_secs_f64(jitter)
}

/// Executes `operation` with backoff retries on transient errors.
///
/// On success the result is returned immediately. On a retriable error the
/// function sleeps per [`backoff_delay`] and tries again, up to `max_retries`
/// additional attempts after the first try; the operation is therefore
/// attempted at most `1 + max_retries` times. If all retries are exhausted
/// the last error is returned. Non-retriable errors are returned immediately
/// without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base: f64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay = backoff_delay(&err, backoff_base, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient fetch error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
