//! Error types for repofetch
//!
//! Not-found conditions (missing file, empty repository) are not errors here:
//! the transport reports them as ordinary values and the pipeline logs them.
//! Everything in this enum either aborts the current repository or is
//! recovered locally by the caller.

use crate::github::retry::{RetryDecision, RetryableError};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for repofetch operations
pub type Result<T> = std::result::Result<T, RepoFetchError>;

/// Error type for repofetch operations
#[derive(Error, Debug)]
pub enum RepoFetchError {
    /// Missing or invalid options, bad config file, malformed arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success response from the GitHub API
    #[error("GitHub API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Rate limited (retry-after duration in seconds)
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl RetryableError for RepoFetchError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            RepoFetchError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    RetryDecision::Retry
                } else if let Some(status) = e.status() {
                    match status.as_u16() {
                        429 => RetryDecision::RetryAfter(Duration::from_secs(60)),
                        500..=599 => RetryDecision::Retry,
                        _ => RetryDecision::NoRetry,
                    }
                } else if e.is_decode() || e.is_builder() {
                    RetryDecision::NoRetry
                } else {
                    RetryDecision::Retry
                }
            }
            RepoFetchError::Api { status, .. } => match status {
                500..=599 => RetryDecision::Retry,
                _ => RetryDecision::NoRetry,
            },
            RepoFetchError::RateLimited(secs) => {
                RetryDecision::RetryAfter(Duration::from_secs(*secs))
            }
            RepoFetchError::Config(_) => RetryDecision::NoRetry,
            RepoFetchError::Auth(_) => RetryDecision::NoRetry,
            RepoFetchError::Io(_) => RetryDecision::NoRetry,
            RepoFetchError::Yaml(_) => RetryDecision::NoRetry,
            RepoFetchError::Other(_) => RetryDecision::NoRetry,
        }
    }
}
