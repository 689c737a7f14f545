//! sni-ranges command line
//!
//! Usage:
//!     echo "*.example.com" | sni-ranges --subs -c 5

use clap::Parser;
use sni_ranges::{
    Config, ExtractionMode, Pipeline, TracingObserver, WriterSink, query::read_queries,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "sni-ranges",
    version,
    about = "Search cloud SNI range lists for the domains read from stdin"
)]
struct Args {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Concurrency level for search [default: 10]
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Output only subdomains
    #[arg(long, conflicts_with = "only_ips")]
    subs: bool,

    /// Output only IP addresses
    #[arg(long)]
    only_ips: bool,

    /// JSON config file with the source table and retry settings
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn mode(&self) -> Option<ExtractionMode> {
        if self.subs {
            Some(ExtractionMode::Subdomains)
        } else if self.only_ips {
            Some(ExtractionMode::Ipv4Prefix)
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "sni_ranges=debug"
    } else {
        "sni_ranges=error"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path).await?,
        None => Config::default(),
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(mode) = args.mode() {
        config.mode = mode;
    }

    // Validates before anything is read or fetched
    let pipeline = Pipeline::new(config, Arc::new(TracingObserver))?;

    let queries = read_queries(BufReader::new(tokio::io::stdin())).await?;
    if queries.is_empty() {
        println!("No input provided. Use stdin or specify flags.");
        return Ok(());
    }

    let reports = pipeline.run(&queries, Arc::new(WriterSink::stdout())).await?;

    for report in &reports {
        for failed in report.failed() {
            let name = pipeline
                .config()
                .source_name(&failed.address)
                .unwrap_or(&failed.address);
            if let Some(error) = failed.outcome.error() {
                tracing::error!(
                    source = %name,
                    query = %report.query,
                    attempts = failed.outcome.attempts(),
                    "Failed to process {}: {}",
                    failed.address,
                    error
                );
            }
        }
    }

    Ok(())
}
