//! Retry with exponential backoff for GitHub API calls
//!
//! Transient failures (connection resets, timeouts, 5xx, secondary rate
//! limits) are retried; anything the server rejected on its merits is not.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Backoff before the first retry
    pub initial_backoff: Duration,

    /// Upper bound for any single wait, including server-provided ones
    pub max_backoff: Duration,

    /// Backoff multiplier
    pub multiplier: f64,

    /// Add up to 25% random jitter
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A config that never retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Short waits, for tests and interactive use
    pub fn quick() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
            jitter: false,
        }
    }

    /// Calculate backoff duration for a given attempt (0-based)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_secs_f64());

        if self.jitter {
            Duration::from_secs_f64(capped * (1.0 + jitter_fraction() * 0.25))
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

/// Pseudo-random value in [0.0, 1.0) derived from the clock
fn jitter_fraction() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

/// Retry classification for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry using the configured backoff
    Retry,
    /// Retry after a server-provided delay
    RetryAfter(Duration),
    /// Permanent failure
    NoRetry,
}

/// Errors that know whether they are worth retrying
pub trait RetryableError {
    fn retry_decision(&self) -> RetryDecision;
}

/// Run `operation` until it succeeds, fails permanently, or retries run out.
///
/// The last error is returned unchanged so callers can still match on it.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let backoff = match err.retry_decision() {
            RetryDecision::NoRetry => {
                debug!(operation = operation_name, attempt, error = %err, "Not retrying");
                return Err(err);
            }
            _ if attempt >= config.max_retries => {
                warn!(
                    operation = operation_name,
                    attempts = attempt + 1,
                    error = %err,
                    "Giving up after retries"
                );
                return Err(err);
            }
            RetryDecision::RetryAfter(wait) => wait.min(config.max_backoff),
            RetryDecision::Retry => config.backoff_duration(attempt),
        };

        warn!(
            operation = operation_name,
            attempt = attempt + 1,
            max_attempts = config.max_retries + 1,
            backoff_secs = backoff.as_secs_f64(),
            error = %err,
            "Retrying request"
        );

        sleep(backoff).await;
        attempt += 1;
    }
}
