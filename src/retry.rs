//! Fixed-delay retry policy for transient external calls.
//!
//! The policy is a plain value injected into whichever component talks to a
//! flaky remote; the error type decides what counts as transient.

use crate::error::AuthError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as transient (worth another attempt) or permanent.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for AuthError {
    fn is_retryable(&self) -> bool {
        match self {
            AuthError::Network(_) | AuthError::Rejected { .. } => true,
            AuthError::MissingSecret
            | AuthError::Io { .. }
            | AuthError::InvalidSecret(_)
            | AuthError::Signing(_)
            | AuthError::InvalidResponse(_) => false,
        }
    }
}

/// How often to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            max_attempts,
            delay,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempts
    /// are used up. The last error is returned unchanged.
    pub async fn run<F, Fut, T, E>(&self, what: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IsRetryable + Display,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempts = attempt, "{what} succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        "{what} failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(error = %e, attempts = attempt, "{what} failed after multiple attempts");
                    } else {
                        tracing::error!(error = %e, "{what} failed");
                    }
                    return Err(e);
                }
            }
        }
    }
}
