//! # sni-ranges
//!
//! Concurrent search over published cloud SNI/IP range lists.
//!
//! Each query runs one pass over a fixed table of remote text sources. A pass hands
//! the sources to a bounded pool of workers; each worker fetches its source with a
//! flat-backoff retry and streams the body line by line, emitting what the selected
//! [`ExtractionMode`] pulls out of every matching line as soon as it is read.
//!
//! ## Design Philosophy
//!
//! - **Streaming** - Source bodies are never buffered whole
//! - **Isolated failures** - One unreachable source never stops the others
//! - **Explicit configuration** - No process-wide state; everything is passed in
//! - **Observable** - Progress is reported as structured [`Event`]s to an [`Observer`]
//!
//! A fetch that fails partway through is restarted from the top of the resource, so
//! lines emitted by the failed attempt can appear again when a later attempt
//! succeeds. Emitted output is never retracted.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sni_ranges::{Config, ExtractionMode, Pipeline, TracingObserver, WriterSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         mode: ExtractionMode::Subdomains,
//!         concurrency: 5,
//!         ..Default::default()
//!     };
//!
//!     let pipeline = Pipeline::new(config, Arc::new(TracingObserver))?;
//!     let reports = pipeline
//!         .run(&["example.com".to_string()], Arc::new(WriterSink::stdout()))
//!         .await?;
//!
//!     for report in &reports {
//!         for failed in report.failed() {
//!             eprintln!("{} failed: {:?}", failed.address, failed.outcome.error());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Line extraction
pub mod extract;
/// Fetch-and-stream with retry
pub mod fetch;
/// Pipeline driver
pub mod pipeline;
/// Worker pool and dispatch passes
pub mod pool;
/// Query input parsing
pub mod query;
/// Retry logic with a flat backoff
pub mod retry;
/// Output sinks
pub mod sink;
/// Core types, outcomes and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, RetryConfig, SourceConfig};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use pipeline::Pipeline;
pub use pool::Dispatcher;
pub use sink::{ChannelSink, CollectingSink, Sink, WriterSink};
pub use types::{
    BroadcastObserver, Event, ExtractionMode, FetchOutcome, NoopObserver, Observer, PassReport,
    Query, SourceAddress, SourceReport, TracingObserver,
};
