//! Bounded retry for fallible external calls.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::warn;

use crate::errors::{ErrorKind, SummarizerError};

/// Delay between attempts. Every variant yields a non-decreasing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// Doubles from `initial` on each retry, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    fn delays(self) -> Box<dyn Iterator<Item = Duration> + Send> {
        match self {
            Backoff::None => Box::new(std::iter::repeat(Duration::ZERO)),
            Backoff::Fixed(delay) => Box::new(FixedInterval::new(delay)),
            Backoff::Exponential { initial, max } => Box::new((0u32..).map(move |step| {
                initial
                    .saturating_mul(2u32.saturating_pow(step))
                    .min(max)
            })),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retryable: ErrorKind,
    backoff: Backoff,
}

impl RetryPolicy {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `max_attempts` is zero.
    pub fn new(max_attempts: u32, retryable: ErrorKind) -> Result<Self, SummarizerError> {
        if max_attempts == 0 {
            return Err(SummarizerError::InvalidConfiguration(
                "retry policy needs at least one attempt".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            retryable,
            backoff: Backoff::None,
        })
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn retryable(&self) -> ErrorKind {
        self.retryable
    }

    /// The waits before the second, third, ... attempt.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + Send + use<> {
        self.backoff
            .delays()
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Run `action` until it succeeds, fails with a non-retryable error, or runs out of attempts.
///
/// Errors whose kind differs from the policy's retryable kind are returned
/// unchanged after a single attempt. When every attempt fails with the
/// retryable kind, the last error is wrapped in `RetryExhausted`.
///
/// # Errors
///
/// See above.
pub async fn execute_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    mut action: F,
) -> Result<T, SummarizerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SummarizerError>>,
{
    let retryable = policy.retryable();
    let max_attempts = policy.max_attempts();
    let mut attempts: u32 = 0;

    let outcome = RetryIf::start(
        policy.delays(),
        || {
            attempts += 1;
            action()
        },
        |err: &SummarizerError| {
            let retry = err.kind() == retryable;
            if retry {
                warn!("Attempt failed with retryable error (max {}): {}", max_attempts, err);
            }
            retry
        },
    )
    .await;

    match outcome {
        Ok(value) => Ok(value),
        Err(err) if err.kind() == retryable => Err(SummarizerError::RetryExhausted {
            attempts,
            source: Box::new(err),
        }),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_rejected() {
        let err = RetryPolicy::new(0, ErrorKind::TransientPlatform).unwrap_err();
        assert!(matches!(err, SummarizerError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_exponential_delays_double_and_cap() {
        let policy = RetryPolicy::new(6, ErrorKind::TransientPlatform)
            .unwrap()
            .with_backoff(Backoff::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_millis(500),
            });

        let delays: Vec<u128> = policy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        let policy = RetryPolicy::new(1, ErrorKind::TransientPlatform)
            .unwrap()
            .with_backoff(Backoff::Fixed(Duration::from_secs(1)));
        assert_eq!(policy.delays().count(), 0);
    }

    #[test]
    fn test_delays_never_decrease() {
        for backoff in [
            Backoff::None,
            Backoff::Fixed(Duration::from_millis(250)),
            Backoff::Exponential {
                initial: Duration::from_millis(1),
                max: Duration::from_secs(60),
            },
        ] {
            let policy = RetryPolicy::new(20, ErrorKind::TransientPlatform)
                .unwrap()
                .with_backoff(backoff);
            let delays: Vec<Duration> = policy.delays().collect();
            assert_eq!(delays.len(), 19);
            assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
