use captioner_config::shared::RetryConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Classification of an error as transient or permanent.
///
/// Only transient errors are retried. Everything else fails the operation on
/// first occurrence so that misconfiguration is not masked behind a long
/// retry loop.
pub trait Transient {
    /// Returns whether retrying the operation may succeed.
    fn is_transient(&self) -> bool;
}

/// Bounded exponential backoff schedule.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    /// Maximum number of attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles after every failed attempt.
    pub base_delay: Duration,
}

impl From<&RetryConfig> for RetrySchedule {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

/// Failure of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The operation failed with a non-transient error; no retries were made
    /// after it occurred.
    #[error(transparent)]
    Fatal(E),

    /// Every attempt failed with a transient error.
    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

/// Returns the delay before the given retry.
///
/// `attempt` counts completed attempts, so the delay before the first retry
/// (`attempt == 1`) is the base delay, before the second retry twice that,
/// and so on. There is no delay before the first attempt.
pub fn backoff_delay(schedule: &RetrySchedule, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    schedule.base_delay.saturating_mul(factor)
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// schedule's attempt budget is exhausted.
///
/// Transient failures are logged as warnings and retried after an
/// exponentially growing delay. The operation must be idempotent: the service
/// accepts at-least-once application under concurrent writers.
pub async fn retry_with_backoff<T, E, F>(
    schedule: &RetrySchedule,
    operation: &str,
    op: F,
) -> Result<T, RetryError<E>>
where
    F: AsyncFnMut() -> Result<T, E>,
    E: Transient + std::error::Error + 'static,
{
    retry_with_backoff_and_sleep(schedule, operation, op, async |delay| {
        tokio::time::sleep(delay).await
    })
    .await
}

/// Retry loop with an injected sleep, so tests can observe the backoff
/// schedule without real delays.
pub(crate) async fn retry_with_backoff_and_sleep<T, E, F, S>(
    schedule: &RetrySchedule,
    operation: &str,
    mut op: F,
    sleep: S,
) -> Result<T, RetryError<E>>
where
    F: AsyncFnMut() -> Result<T, E>,
    S: AsyncFn(Duration),
    E: Transient + std::error::Error + 'static,
{
    let mut attempt = 0u32;

    loop {
        if attempt > 0 {
            sleep(backoff_delay(schedule, attempt)).await;
        }
        attempt += 1;

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                if attempt >= schedule.max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }

                warn!(operation, attempt, error = %e, "transient failure, retrying");
            }
            Err(e) => return Err(RetryError::Fatal(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Error)]
    enum TestError {
        #[error("policy changed concurrently")]
        Conflict,
        #[error("permission denied")]
        PermissionDenied,
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Conflict)
        }
    }

    fn schedule(max_attempts: u32, base_delay_ms: u64) -> RetrySchedule {
        RetrySchedule {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    #[test]
    fn backoff_delay_doubles_per_retry() {
        let schedule = schedule(5, 100);

        assert_eq!(backoff_delay(&schedule, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&schedule, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(&schedule, 3), Duration::from_millis(400));
        assert_eq!(backoff_delay(&schedule, 4), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn conflicts_exhaust_the_attempt_budget() {
        let attempts = Cell::new(0u32);
        let sleeps = RefCell::new(Vec::new());

        let result: Result<(), _> = retry_with_backoff_and_sleep(
            &schedule(5, 100),
            "test",
            async || {
                attempts.set(attempts.get() + 1);
                Err(TestError::Conflict)
            },
            async |delay| sleeps.borrow_mut().push(delay),
        )
        .await;

        assert_eq!(attempts.get(), 5);
        assert_eq!(
            *sleeps.borrow(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 5),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_after_transient_failures_stops_retrying() {
        let attempts = Cell::new(0u32);
        let sleeps = RefCell::new(Vec::new());

        let result = retry_with_backoff_and_sleep(
            &schedule(5, 100),
            "test",
            async || {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 3 {
                    Err(TestError::Conflict)
                } else {
                    Ok(attempts.get())
                }
            },
            async |delay| sleeps.borrow_mut().push(delay),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.get(), 3);
        assert_eq!(
            *sleeps.borrow(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn non_transient_errors_fail_on_first_occurrence() {
        let attempts = Cell::new(0u32);
        let sleeps = RefCell::new(Vec::new());

        let result: Result<(), _> = retry_with_backoff_and_sleep(
            &schedule(5, 100),
            "test",
            async || {
                attempts.set(attempts.get() + 1);
                Err(TestError::PermissionDenied)
            },
            async |delay| sleeps.borrow_mut().push(delay),
        )
        .await;

        assert_eq!(attempts.get(), 1);
        assert!(sleeps.borrow().is_empty());
        assert!(matches!(
            result,
            Err(RetryError::Fatal(TestError::PermissionDenied))
        ));
    }

    #[tokio::test]
    async fn immediate_success_never_sleeps() {
        let sleeps = RefCell::new(Vec::new());

        let result: Result<&str, RetryError<TestError>> = retry_with_backoff_and_sleep(
            &schedule(5, 100),
            "test",
            async || Ok("done"),
            async |delay| sleeps.borrow_mut().push(delay),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert!(sleeps.borrow().is_empty());
    }
}
