//! Bounded retry around remote calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Wait strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Same wait before every retry.
    Fixed(Duration),
    /// `initial * 2^(attempt - 1)`, capped at `max`, plus up to 25% jitter.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Wait before the retry following failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(wait) => wait,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                let base = initial.saturating_mul(factor).min(max);
                let jitter_ms = base.as_millis() as u64 / 4;
                if jitter_ms == 0 {
                    base
                } else {
                    base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
                }
            }
        }
    }
}

/// Retry configuration composed around any fallible remote call.
///
/// Fields are public so tests can shrink the waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy that retries without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::None)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Transient failures are logged with `context` and retried. Non-transient
    /// errors are returned as-is on the first occurrence. Exhaustion yields
    /// [`Error::RetriesExhausted`] wrapping the last failure.
    pub async fn run<T, F, Fut>(&self, context: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            tracing::error!(
                "Attempt {}/{} failed for {}: {}",
                attempt,
                self.max_attempts,
                context,
                err
            );

            if attempt >= self.max_attempts {
                tracing::error!(
                    "Giving up on {} after {} attempt(s)",
                    context,
                    attempt
                );
                return Err(Error::RetriesExhausted {
                    context: context.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let wait = match err {
                Error::RateLimited(secs) => self.backoff.delay(attempt).max(Duration::from_secs(secs)),
                _ => self.backoff.delay(attempt),
            };
            if !wait.is_zero() {
                tracing::debug!("Retrying {} in {:?}", context, wait);
                sleep(wait).await;
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            5,
            Backoff::Exponential {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(30),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::immediate(5);

        let result = policy
            .run("posts chunk", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 5 {
                    Err(Error::Api("HTTP 502".into()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_exhaustion_is_distinguished() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::immediate(5);

        let result: Result<()> = policy
            .run("DID: did:plc:abc, CID: bafy", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Api("HTTP 500".into()))
            })
            .await;

        match result {
            Err(Error::RetriesExhausted {
                context, attempts, ..
            }) => {
                assert_eq!(attempts, 5);
                assert_eq!(context, "DID: did:plc:abc, CID: bafy");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::immediate(5);

        let result: Result<()> = policy
            .run("handle", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::HandleNotFound("ghost.example".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::HandleNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(400),
        };
        assert!(backoff.delay(1) >= Duration::from_millis(100));
        assert!(backoff.delay(1) <= Duration::from_millis(125));
        assert!(backoff.delay(10) >= Duration::from_millis(400));
        assert!(backoff.delay(10) <= Duration::from_millis(500));
        assert_eq!(Backoff::None.delay(3), Duration::ZERO);
        assert_eq!(
            Backoff::Fixed(Duration::from_millis(7)).delay(3),
            Duration::from_millis(7)
        );
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }
}
