//! Worker pool: runs one dispatch pass over every source address
//!
//! A pass pre-loads a shared work queue with all addresses, spawns a fixed number of
//! workers that drain it, and waits for every worker to exit. Each address is taken
//! by exactly one worker. A failing address never stops the others; its outcome is
//! collected into the pass report like any other.

use crate::config::validate_concurrency;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::sink::Sink;
use crate::types::{Event, ExtractionMode, FetchOutcome, PassReport, SourceAddress, SourceReport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Queue of addresses for one pass
///
/// The queue is filled at construction and has no way to add work afterwards, so
/// an empty queue means the pass has no more work.
#[derive(Debug)]
pub struct WorkQueue {
    items: Mutex<VecDeque<SourceAddress>>,
}

impl WorkQueue {
    /// Create a queue holding every address, in order
    pub fn new(addresses: impl IntoIterator<Item = SourceAddress>) -> Self {
        Self {
            items: Mutex::new(addresses.into_iter().collect()),
        }
    }

    /// Take the next address, or `None` once the queue is drained
    pub fn pop(&self) -> Option<SourceAddress> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    /// Addresses still waiting
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns true once every address has been taken
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed-size pool of fetch workers
#[derive(Debug, Clone)]
pub struct Dispatcher {
    fetcher: Arc<Fetcher>,
    concurrency: usize,
}

impl Dispatcher {
    /// Create a dispatcher running `concurrency` workers per pass
    ///
    /// # Errors
    /// Returns a configuration error if `concurrency` is zero
    pub fn new(fetcher: Arc<Fetcher>, concurrency: usize) -> Result<Self> {
        validate_concurrency(concurrency)?;
        Ok(Self {
            fetcher,
            concurrency,
        })
    }

    /// Number of workers per pass
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every address for `query`, streaming results into `sink`
    ///
    /// Returns once all workers have exited. The report has one entry per address,
    /// in completion order. A fetch that panics is recorded as an `Error::Worker`
    /// failure for its address and the worker moves on to the next one.
    ///
    /// # Errors
    /// Returns `Error::Worker` only if a worker itself could not be joined.
    pub async fn run_pass(
        &self,
        addresses: &[SourceAddress],
        query: &str,
        mode: ExtractionMode,
        sink: Arc<dyn Sink>,
    ) -> Result<PassReport> {
        let observer = self.fetcher.observer().clone();
        observer.on_event(&Event::PassStarted {
            query: query.to_string(),
            sources: addresses.len(),
            concurrency: self.concurrency,
        });

        let queue = Arc::new(WorkQueue::new(addresses.iter().cloned()));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<SourceReport>();
        let mut workers = JoinSet::new();

        for _ in 0..self.concurrency {
            let queue = Arc::clone(&queue);
            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&sink);
            let report_tx = report_tx.clone();
            let query = query.to_string();

            workers.spawn(async move {
                while let Some(address) = queue.pop() {
                    let outcome = fetch_isolated(&fetcher, &address, &query, mode, &sink).await;
                    if report_tx.send(SourceReport { address, outcome }).is_err() {
                        break;
                    }
                }
            });
        }
        drop(report_tx);

        let mut worker_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Dispatch worker failed");
                worker_error.get_or_insert(Error::Worker(e.to_string()));
            }
        }

        let mut report = PassReport {
            query: query.to_string(),
            outcomes: Vec::with_capacity(addresses.len()),
        };
        while let Some(source_report) = report_rx.recv().await {
            report.outcomes.push(source_report);
        }

        if let Some(e) = worker_error {
            return Err(e);
        }

        observer.on_event(&Event::PassCompleted {
            query: report.query.clone(),
            succeeded: report.succeeded().count(),
            failed: report.failed().count(),
        });

        Ok(report)
    }
}

/// Run one fetch in its own task so a panic fails only that address
async fn fetch_isolated(
    fetcher: &Arc<Fetcher>,
    address: &str,
    query: &str,
    mode: ExtractionMode,
    sink: &Arc<dyn Sink>,
) -> FetchOutcome {
    let task = {
        let fetcher = Arc::clone(fetcher);
        let sink = Arc::clone(sink);
        let address = address.to_string();
        let query = query.to_string();
        tokio::spawn(async move {
            fetcher
                .fetch_and_stream(&address, &query, mode, sink.as_ref())
                .await
        })
    };

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(source = %address, error = %e, "Fetch task failed");
            let error = Error::Worker(e.to_string());
            fetcher.observer().on_event(&Event::SourceFailed {
                source: address.to_string(),
                attempts: 0,
                error: error.to_string(),
            });
            FetchOutcome::Failure { attempts: 0, error }
        }
    }
}
