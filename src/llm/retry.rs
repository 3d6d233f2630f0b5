//! Bounded retry with fixed delay.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `op` up to `max_attempts` total attempts, sleeping `delay`
/// between attempts when `is_retryable` marks the error as worth
/// retrying. Any other error propagates immediately.
///
/// On exhaustion the last error is propagated — callers always get a
/// real result or a real error, never an unset default. Each call has
/// its own attempt budget; nothing is shared across invocations.
pub async fn retry_with_delay<T, E, F, Fut, P>(
    max_attempts: u32,
    delay: Duration,
    is_retryable: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn exhaustion_makes_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), &str> =
            retry_with_delay(5, Duration::from_secs(10), |_| true, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("rate limited")
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "rate limited");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_propagates_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), &str> =
            retry_with_delay(5, Duration::from_secs(10), |_| false, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("bad request")
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<u32, &str> =
            retry_with_delay(5, Duration::from_secs(10), |_| true, move || {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 { Err("rate limited") } else { Ok(n) }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_does_not_sleep() {
        let before = tokio::time::Instant::now();
        let result: Result<u32, &str> =
            retry_with_delay(5, Duration::from_secs(10), |_| true, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
