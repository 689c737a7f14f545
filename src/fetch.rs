//! Fetch-and-stream with retry
//!
//! Each attempt issues a fresh GET and scans the body line by line as it arrives; the
//! body is never buffered whole. An attempt that fails after some lines were emitted
//! is retried from the start of the resource, so those lines can be emitted again by
//! a later attempt. Output is never retracted.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::retry::retry_with_backoff;
use crate::sink::Sink;
use crate::types::{Event, ExtractionMode, FetchOutcome, Observer};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

/// User-Agent sent when the configuration does not override it
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Returns true if `line` passes the query filter
///
/// The empty query matches everything. Otherwise this is a case-sensitive substring test.
pub fn matches_query(line: &str, query: &str) -> bool {
    query.is_empty() || line.contains(query)
}

/// Fetches sources and streams matching lines into a sink
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryConfig,
    observer: Arc<dyn Observer>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher with an HTTP client built from the configuration
    ///
    /// # Errors
    /// Returns `Error::Transport` if the HTTP client cannot be created
    pub fn new(config: &Config, observer: Arc<dyn Observer>) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self::with_client(client, config.retry.clone(), observer))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(
        client: reqwest::Client,
        retry: RetryConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            client,
            retry,
            observer,
        }
    }

    /// Retry settings in use
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Observer receiving this fetcher's events
    pub fn observer(&self) -> &Arc<dyn Observer> {
        &self.observer
    }

    /// Fetch `address` and forward the extraction of every matching line to `sink`
    ///
    /// Never returns early with an error: all failures end up in the outcome, with
    /// the error of the last attempt.
    pub async fn fetch_and_stream(
        &self,
        address: &str,
        query: &str,
        mode: ExtractionMode,
        sink: &dyn Sink,
    ) -> FetchOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let observer = &self.observer;

        let retried = retry_with_backoff(
            &self.retry,
            |attempt, error: &Error, will_retry| {
                observer.on_event(&Event::AttemptFailed {
                    source: address.to_string(),
                    attempt,
                    max_attempts,
                    code: error.code().to_string(),
                    error: error.to_string(),
                    will_retry,
                });
            },
            move |attempt| {
                observer.on_event(&Event::AttemptStarted {
                    source: address.to_string(),
                    attempt,
                    max_attempts,
                });
                self.stream_once(address, query, mode, sink)
            },
        )
        .await;

        match retried.result {
            Ok(emitted) => {
                self.observer.on_event(&Event::SourceCompleted {
                    source: address.to_string(),
                    attempts: retried.attempts,
                    emitted,
                });
                FetchOutcome::Success {
                    attempts: retried.attempts,
                    emitted,
                }
            }
            Err(error) => {
                self.observer.on_event(&Event::SourceFailed {
                    source: address.to_string(),
                    attempts: retried.attempts,
                    error: error.to_string(),
                });
                FetchOutcome::Failure {
                    attempts: retried.attempts,
                    error,
                }
            }
        }
    }

    /// One attempt: request, status check, then scan the body to the end
    async fn stream_once(
        &self,
        address: &str,
        query: &str,
        mode: ExtractionMode,
        sink: &dyn Sink,
    ) -> Result<u64> {
        let response = self.client.get(address).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        let mut reader = StreamReader::new(body);
        let mut buf = Vec::new();
        let mut emitted = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(Error::StreamRead)?;
            if read == 0 {
                break;
            }

            let line = String::from_utf8_lossy(trim_line_ending(&buf));
            if !matches_query(&line, query) {
                continue;
            }
            for item in extract(&line, mode) {
                sink.emit(item).map_err(Error::Sink)?;
                emitted += 1;
            }
        }

        Ok(emitted)
    }
}

/// Drop a trailing `\n` or `\r\n`
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
