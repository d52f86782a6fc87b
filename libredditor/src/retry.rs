//! Retry policy and the retry loop shared by session setup and fetching
//!
//! Only [`ErrorKind::Transient`] failures are retried. After a failed attempt
//! `k` the loop sleeps `base_delay × k × backoff_multiplier` before attempt
//! `k + 1`; no sleep follows the final attempt.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::classify::{classify, ErrorKind};
use crate::error::{ConfigError, PlatformError, RetryFailure};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 1;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given duration, then try again
    Retry(Duration),
    /// Give up and report the failure
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `max_attempts` or
    /// `backoff_multiplier` is zero.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        backoff_multiplier: u32,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if backoff_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "retry.backoff_multiplier must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_attempts,
            base_delay,
            backoff_multiplier,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_multiplier(&self) -> u32 {
        self.backoff_multiplier
    }

    /// Delay to wait after failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.saturating_mul(self.backoff_multiplier))
    }

    /// Decide whether failed attempt `attempt` (1-based) of kind `kind` is retried
    pub fn decide(&self, kind: ErrorKind, attempt: u32) -> RetryDecision {
        if kind.is_retryable() && attempt < self.max_attempts {
            RetryDecision::Retry(self.delay_for(attempt))
        } else {
            RetryDecision::Abort
        }
    }

    /// Run `operation` until it succeeds or the policy gives up
    ///
    /// `attempt_fn` receives the 1-based attempt number. Every call starts the
    /// operation from scratch; nothing from a failed attempt is carried over.
    ///
    /// # Errors
    ///
    /// Returns a [`RetryFailure`] carrying the classified kind of the last
    /// failure when a fatal kind is hit or attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T, RetryFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        let mut state = RetryState::Attempting(1);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => match attempt_fn(attempt).await {
                    Ok(value) => RetryState::Succeeded(value),
                    Err(error) => self.on_failure(operation, attempt, error),
                },
                RetryState::Waiting { attempt, delay } => {
                    sleep(delay).await;
                    RetryState::Attempting(attempt + 1)
                }
                RetryState::Succeeded(value) => return Ok(value),
                RetryState::Failed(failure) => return Err(failure),
            };
        }
    }

    fn on_failure<T>(&self, operation: &str, attempt: u32, error: PlatformError) -> RetryState<T> {
        let kind = classify(&error);

        match self.decide(kind, attempt) {
            RetryDecision::Retry(delay) => {
                warn!(
                    "Network/API error during {} (attempt {}/{}): {}. Retrying in {}s...",
                    operation,
                    attempt,
                    self.max_attempts,
                    error,
                    delay.as_secs_f32()
                );
                RetryState::Waiting { attempt, delay }
            }
            RetryDecision::Abort => RetryState::Failed(RetryFailure {
                kind,
                attempts: attempt,
                source: error,
            }),
        }
    }
}

enum RetryState<T> {
    Attempting(u32),
    Waiting { attempt: u32, delay: Duration },
    Succeeded(T),
    Failed(RetryFailure),
}
