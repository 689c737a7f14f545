//! Retry logic with a flat backoff
//!
//! Every failed attempt is followed by the same fixed delay before the next one, up
//! to a total attempt budget. Errors decide for themselves whether another attempt
//! makes sense through [`IsRetryable`].
//!
//! # Example
//!
//! ```no_run
//! use sni_ranges::retry::{IsRetryable, retry_with_backoff};
//! use sni_ranges::config::RetryConfig;
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "flaky")
//!     }
//! }
//!
//! impl IsRetryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() {
//! let config = RetryConfig::default();
//! let retried = retry_with_backoff(
//!     &config,
//!     |attempt, err: &Flaky, will_retry| {
//!         eprintln!("attempt {attempt}: {err} (retry: {will_retry})")
//!     },
//!     |_attempt| async { Ok::<_, Flaky>(42) },
//! )
//! .await;
//! assert_eq!(retried.attempts, 1);
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Any transport failure, including timeouts and DNS
            Error::Transport(_) => true,
            // Every non-2xx status is retried, permanent ones included
            Error::HttpStatus { .. } => true,
            // Truncated or broken bodies restart from the beginning
            Error::StreamRead(_) => true,
            Error::Config { .. } => false,
            // Output side is broken; fetching again won't help
            Error::Sink(_) => false,
            Error::Io(_) => false,
            Error::Serialization(_) => false,
            Error::Worker(_) => false,
            Error::Other(_) => false,
        }
    }
}

/// Result of a retried operation along with the number of attempts it took
#[derive(Debug)]
pub struct Retried<T, E> {
    /// Attempts made, including the last one
    pub attempts: u32,
    /// Value of the successful attempt, or the error of the last one
    pub result: Result<T, E>,
}

/// Execute an async operation, retrying with a flat delay
///
/// `operation` receives the 1-based attempt number. `on_failure` is called after every
/// failed attempt with the attempt number, the error, and whether another attempt
/// will follow. A `max_attempts` of zero is treated as one.
pub async fn retry_with_backoff<F, Fut, T, E, N>(
    config: &RetryConfig,
    mut on_failure: N,
    mut operation: F,
) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable,
    N: FnMut(u32, &E, bool),
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return Retried {
                    attempts: attempt,
                    result: Ok(value),
                };
            }
            Err(e) => {
                let will_retry = e.is_retryable() && attempt < max_attempts;
                on_failure(attempt, &e, will_retry);

                if !will_retry {
                    return Retried {
                        attempts: attempt,
                        result: Err(e),
                    };
                }

                tokio::time::sleep(config.backoff).await;
                attempt += 1;
            }
        }
    }
}
