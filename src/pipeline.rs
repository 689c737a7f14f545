//! Pipeline driver: one dispatch pass per query
//!
//! Queries run strictly one after another; only the fetches inside a single pass
//! are concurrent.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::pool::Dispatcher;
use crate::sink::Sink;
use crate::types::{ExtractionMode, Observer, PassReport, Query, SourceAddress};
use std::sync::Arc;

/// Run one pass per query over `addresses`, in query order
///
/// An empty query list does no work. A zero `concurrency` is rejected before any
/// request is made.
pub async fn run(
    fetcher: Arc<Fetcher>,
    queries: &[Query],
    addresses: &[SourceAddress],
    mode: ExtractionMode,
    concurrency: usize,
    sink: Arc<dyn Sink>,
) -> Result<Vec<PassReport>> {
    let dispatcher = Dispatcher::new(fetcher, concurrency)?;
    run_passes(&dispatcher, queries, addresses, mode, sink).await
}

async fn run_passes(
    dispatcher: &Dispatcher,
    queries: &[Query],
    addresses: &[SourceAddress],
    mode: ExtractionMode,
    sink: Arc<dyn Sink>,
) -> Result<Vec<PassReport>> {
    let mut reports = Vec::with_capacity(queries.len());
    for query in queries {
        let report = dispatcher
            .run_pass(addresses, query, mode, Arc::clone(&sink))
            .await?;
        reports.push(report);
    }
    Ok(reports)
}

/// Configured search pipeline
///
/// Holds the validated configuration and the worker pool built from it. Nothing is
/// shared between runs except the HTTP client's connection pool.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    dispatcher: Dispatcher,
}

impl Pipeline {
    /// Validate `config` and build the fetcher and worker pool
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings, or an error if the HTTP
    /// client cannot be created
    pub fn new(config: Config, observer: Arc<dyn Observer>) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(Fetcher::new(&config, observer)?);
        let dispatcher = Dispatcher::new(fetcher, config.concurrency)?;
        Ok(Self { config, dispatcher })
    }

    /// The configuration this pipeline was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Search every configured source for each query
    pub async fn run(&self, queries: &[Query], sink: Arc<dyn Sink>) -> Result<Vec<PassReport>> {
        let addresses = self.config.addresses();
        run_passes(&self.dispatcher, queries, &addresses, self.config.mode, sink).await
    }
}
