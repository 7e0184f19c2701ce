//! Bounded retry with pluggable backoff.
//!
//! One policy object serves both retry sites in the engine: the search call
//! (linear backoff, every error retryable) and the batch send (exponential
//! backoff, rate-limit errors only). Keeping the two strategies as data makes
//! them testable without sleeping.

use std::future::Future;
use std::time::Duration;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// No delay between attempts.
    None,
    /// `base × attempt_number` after the Nth failed attempt.
    Linear { base: Duration },
    /// `base × 2^(attempt_number − 1)` after the Nth failed attempt.
    Exponential { base: Duration },
}

impl Backoff {
    /// Delay to wait after `attempt` (1-based) has failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Linear { base } => *base * attempt,
            Backoff::Exponential { base } => *base * 2u32.saturating_pow(attempt.saturating_sub(1)),
        }
    }
}

/// A bounded retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; it is clamped to at least 1.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds, attempts run out, or an error fails the
    /// `retryable` predicate. The closure receives the 1-based attempt
    /// number. Returns the last error on exhaustion.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        mut op: F,
        retryable: P,
    ) -> std::result::Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.max_attempts || !retryable(&e) {
                        return Err(e);
                    }
                    let delay = self.backoff.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Run `op` with every error considered retryable.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.run_if(op, |_| true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_linear_delays() {
        let backoff = Backoff::Linear {
            base: Duration::from_millis(1000),
        };
        assert_eq!(backoff.delay_after(1), Duration::from_millis(1000));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(2000));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_exponential_delays() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(1000),
        };
        assert_eq!(backoff.delay_after(1), Duration::from_millis(1000));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(2000));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(4000));
        assert_eq!(backoff.delay_after(4), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Backoff::None);
        let result: Result<u32, String> = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    if attempt < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Backoff::None);
        let result: Result<(), String> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err("down".to_string()) }
            })
            .await;
        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(4, Backoff::None);
        let result: Result<(), &str> = policy
            .run_if(
                |_| {
                    calls.fetch_add(1, Ordering::Relaxed);
                    async { Err("permanent") }
                },
                |e| *e != "permanent",
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
