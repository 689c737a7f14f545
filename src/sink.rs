//! Output sinks
//!
//! Workers emit results concurrently, so every sink serializes writes internally.
//! Items from one source arrive in source order; items from different sources
//! interleave arbitrarily.

use std::io::{self, Write};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Destination for extracted items
pub trait Sink: Send + Sync {
    /// Write one item. The sink adds its own line terminator where relevant.
    fn emit(&self, item: &str) -> io::Result<()>;
}

/// Line-oriented sink over any writer, one item per line
///
/// Each item is flushed as soon as it is written so output appears while sources are
/// still streaming.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterSink<io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn emit(&self, item: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("writer sink lock poisoned"))?;
        writeln!(writer, "{}", item)?;
        writer.flush()
    }
}

/// Sink that keeps every item in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the items collected so far
    pub fn items(&self) -> Vec<String> {
        self.items
            .lock()
            .map(|items| items.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Sink for CollectingSink {
    fn emit(&self, item: &str) -> io::Result<()> {
        self.items
            .lock()
            .map_err(|_| io::Error::other("collecting sink lock poisoned"))?
            .push(item.to_string());
        Ok(())
    }
}

/// Sink that forwards items into an unbounded channel
///
/// Emitting fails with `BrokenPipe` once the receiver is dropped.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Sink for ChannelSink {
    fn emit(&self, item: &str) -> io::Result<()> {
        self.tx
            .send(item.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
