//! Configuration types for sni-ranges

use crate::error::{Error, Result};
use crate::types::{ExtractionMode, SourceAddress};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Base location of the published SNI range lists
const SNI_RANGES_BASE: &str = "http://kaeferjaeger.gay/sni-ip-ranges";

/// A named remote list to search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name (e.g., "Amazon")
    pub name: String,

    /// Address of the line-oriented text resource
    pub url: SourceAddress,
}

impl SourceConfig {
    /// Create a source entry
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Retry behavior for a single source fetch
///
/// The delay between attempts is flat: every failed attempt is followed by the same
/// `backoff` before the next one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts per source, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (default: 2 seconds)
    #[serde(default = "default_backoff", with = "duration_serde")]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

/// Main configuration for sni-ranges
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Source table, searched in this order (default: the five cloud provider lists)
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Number of concurrent workers per pass (default: 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// What to emit for each matching line (default: the raw line)
    #[serde(default)]
    pub mode: ExtractionMode,

    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-request timeout, covering connect and body (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request (reqwest default if None)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            concurrency: default_concurrency(),
            mode: ExtractionMode::default(),
            retry: RetryConfig::default(),
            request_timeout: default_request_timeout(),
            user_agent: None,
        }
    }
}

impl Config {
    /// Parse a JSON configuration document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file and validate it
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Check the configuration before any dispatch begins
    ///
    /// A zero concurrency is rejected rather than coerced to one worker.
    pub fn validate(&self) -> Result<()> {
        validate_concurrency(self.concurrency)?;

        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts", "at least one attempt is required"));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config(
                "request_timeout",
                "request timeout must be greater than zero",
            ));
        }

        if self.sources.is_empty() {
            return Err(Error::config("sources", "source table is empty"));
        }

        for (i, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(Error::config(
                    format!("sources[{i}].name"),
                    "source name must not be empty",
                ));
            }
            validate_source_url(&source.url)
                .map_err(|message| Error::config(format!("sources[{i}].url"), message))?;
        }

        Ok(())
    }

    /// Addresses of every configured source, in table order
    pub fn addresses(&self) -> Vec<SourceAddress> {
        self.sources.iter().map(|s| s.url.clone()).collect()
    }

    /// Display name for an address, if it is in the table
    pub fn source_name(&self, address: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.url == address)
            .map(|s| s.name.as_str())
    }
}

/// Reject a worker count of zero
pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if concurrency == 0 {
        return Err(Error::config("concurrency", "concurrency must be at least 1"));
    }
    Ok(())
}

fn validate_source_url(url_str: &str) -> std::result::Result<(), String> {
    let parsed = url::Url::parse(url_str)
        .map_err(|e| format!("invalid source URL '{}': {}", url_str, e))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "URL scheme '{}' is not allowed; only http and https are supported",
            scheme
        )),
    }
}

fn default_sources() -> Vec<SourceConfig> {
    [
        ("Amazon", "amazon"),
        ("DigitalOcean", "digitalocean"),
        ("Google", "google"),
        ("Microsoft", "microsoft"),
        ("Oracle", "oracle"),
    ]
    .into_iter()
    .map(|(name, dir)| {
        SourceConfig::new(name, format!("{SNI_RANGES_BASE}/{dir}/ipv4_merged_sni.txt"))
    })
    .collect()
}

fn default_concurrency() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_secs(2)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
