//! Core types, outcomes and events

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a remote line-oriented text resource (opaque to the pipeline)
pub type SourceAddress = String;

/// Substring to test lines against. The empty query matches every line.
pub type Query = String;

/// Selects which part of a matching line is emitted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Emit the whole line unchanged (default)
    #[default]
    RawLine,
    /// Emit the names listed in the line's first `[...]` group
    Subdomains,
    /// Emit the dotted-quad prefix at the start of the line
    Ipv4Prefix,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionMode::RawLine => "raw_line",
            ExtractionMode::Subdomains => "subdomains",
            ExtractionMode::Ipv4Prefix => "ipv4_prefix",
        };
        f.write_str(s)
    }
}

/// Result of fetching and streaming one source
///
/// There is no partial success: an attempt that failed mid-stream is a failure even
/// though the lines it already emitted stay emitted.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The body was consumed to the end
    Success {
        /// Number of attempts made, including the successful one
        attempts: u32,
        /// Number of items forwarded to the sink by the successful attempt
        emitted: u64,
    },
    /// Every attempt failed, or a non-retryable error stopped the fetch
    Failure {
        /// Number of attempts made
        attempts: u32,
        /// Error from the last attempt
        error: Error,
    },
}

impl FetchOutcome {
    /// Returns true if the source was streamed to completion
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts, .. } | FetchOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The last error, if the fetch failed
    pub fn error(&self) -> Option<&Error> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Outcome for one source address within a pass
#[derive(Debug)]
pub struct SourceReport {
    /// The address that was fetched
    pub address: SourceAddress,
    /// What happened
    pub outcome: FetchOutcome,
}

/// Per-address outcomes of one dispatch pass, in completion order
#[derive(Debug, Default)]
pub struct PassReport {
    /// Query the pass searched for
    pub query: Query,
    /// One entry per dispatched address
    pub outcomes: Vec<SourceReport>,
}

impl PassReport {
    /// Look up the outcome for an address
    pub fn get(&self, address: &str) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.address == address)
            .map(|r| &r.outcome)
    }

    /// Reports for sources that streamed successfully
    pub fn succeeded(&self) -> impl Iterator<Item = &SourceReport> {
        self.outcomes.iter().filter(|r| r.outcome.is_success())
    }

    /// Reports for sources that failed
    pub fn failed(&self) -> impl Iterator<Item = &SourceReport> {
        self.outcomes.iter().filter(|r| !r.outcome.is_success())
    }

    /// Returns true when every dispatched address succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|r| r.outcome.is_success())
    }
}

/// Event emitted while a pass runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A dispatch pass is starting
    PassStarted {
        /// Query for this pass
        query: Query,
        /// Number of addresses queued
        sources: usize,
        /// Number of workers
        concurrency: usize,
    },

    /// A fetch attempt is starting
    AttemptStarted {
        /// Source being fetched
        source: SourceAddress,
        /// 1-based attempt number
        attempt: u32,
        /// Attempt budget
        max_attempts: u32,
    },

    /// A fetch attempt failed
    AttemptFailed {
        /// Source being fetched
        source: SourceAddress,
        /// 1-based attempt number
        attempt: u32,
        /// Attempt budget
        max_attempts: u32,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
        /// Whether another attempt follows after the backoff
        will_retry: bool,
    },

    /// A source was streamed to completion
    SourceCompleted {
        /// Source that was fetched
        source: SourceAddress,
        /// Attempts used
        attempts: u32,
        /// Items forwarded to the sink by the successful attempt
        emitted: u64,
    },

    /// A source gave up
    SourceFailed {
        /// Source that was fetched
        source: SourceAddress,
        /// Attempts used
        attempts: u32,
        /// Error from the last attempt
        error: String,
    },

    /// A dispatch pass finished
    PassCompleted {
        /// Query for this pass
        query: Query,
        /// Sources that succeeded
        succeeded: usize,
        /// Sources that failed
        failed: usize,
    },
}

/// Receives pipeline events
///
/// Observers are called from worker tasks and must not block for long.
pub trait Observer: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &Event);
}

impl<F> Observer for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Observer that discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: &Event) {}
}

/// Observer that logs events through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &Event) {
        match event {
            Event::PassStarted {
                query,
                sources,
                concurrency,
            } => {
                tracing::info!(query = %query, sources, concurrency, "Starting search pass");
            }
            Event::AttemptStarted {
                source,
                attempt,
                max_attempts,
            } => {
                tracing::debug!(source = %source, attempt, max_attempts, "Fetching source");
            }
            Event::AttemptFailed {
                source,
                attempt,
                max_attempts,
                code,
                error,
                will_retry,
            } => {
                if *will_retry {
                    tracing::info!(
                        source = %source,
                        attempt,
                        max_attempts,
                        code = %code,
                        error = %error,
                        "Retrying source"
                    );
                } else {
                    tracing::warn!(
                        source = %source,
                        attempt,
                        max_attempts,
                        code = %code,
                        error = %error,
                        "Fetch attempt failed"
                    );
                }
            }
            Event::SourceCompleted {
                source,
                attempts,
                emitted,
            } => {
                tracing::debug!(source = %source, attempts, emitted, "Source processed");
            }
            Event::SourceFailed {
                source,
                attempts,
                error,
            } => {
                tracing::warn!(source = %source, attempts, error = %error, "Giving up on source");
            }
            Event::PassCompleted {
                query,
                succeeded,
                failed,
            } => {
                tracing::info!(query = %query, succeeded, failed, "Search pass complete");
            }
        }
    }
}

/// Observer that fans events out to broadcast subscribers
///
/// Events are buffered, but a subscriber that falls behind by more than the channel
/// capacity misses the oldest events (`RecvError::Lagged`).
#[derive(Clone, Debug)]
pub struct BroadcastObserver {
    tx: tokio::sync::broadcast::Sender<Event>,
}

impl BroadcastObserver {
    /// Create a broadcaster with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = tokio::sync::broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Observer for BroadcastObserver {
    fn on_event(&self, event: &Event) {
        // No subscribers is fine
        let _ = self.tx.send(event.clone());
    }
}
