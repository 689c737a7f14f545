//! Line extraction
//!
//! Maps one line of a source list to the strings emitted for it. The published SNI
//! range lists look like:
//!
//! ```text
//! 3.5.140.2 -- [s3.ap-northeast-2.amazonaws.com *.s3.ap-northeast-2.amazonaws.com]
//! ```
//!
//! Extraction is purely syntactic: the IPv4 prefix is a dotted run of digit groups
//! with no octet range check.

use crate::types::ExtractionMode;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static BRACKET_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]").expect("bracket group pattern is valid"));

#[allow(clippy::expect_used)]
static IPV4_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+").expect("IPv4 prefix pattern is valid")
});

/// Strip one leading wildcard label (`*.`) from a name
pub fn strip_wildcard(name: &str) -> &str {
    name.strip_prefix("*.").unwrap_or(name)
}

/// Extract the output strings for `line` under `mode`
///
/// # Examples
///
/// ```
/// use sni_ranges::extract::extract;
/// use sni_ranges::ExtractionMode;
///
/// let line = "10.0.0.1 -- [a.example.com *.b.example.com]";
/// assert_eq!(extract(line, ExtractionMode::Subdomains), vec!["a.example.com", "b.example.com"]);
/// assert_eq!(extract(line, ExtractionMode::Ipv4Prefix), vec!["10.0.0.1"]);
/// assert_eq!(extract(line, ExtractionMode::RawLine), vec![line]);
/// ```
pub fn extract(line: &str, mode: ExtractionMode) -> Vec<&str> {
    match mode {
        ExtractionMode::RawLine => vec![line],
        ExtractionMode::Subdomains => subdomains(line),
        ExtractionMode::Ipv4Prefix => ipv4_prefix(line).into_iter().collect(),
    }
}

/// Names in the first `[...]` group of the line, wildcard prefixes removed
pub fn subdomains(line: &str) -> Vec<&str> {
    BRACKET_GROUP
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|group| group.as_str().split_whitespace().map(strip_wildcard).collect())
        .unwrap_or_default()
}

/// Dotted-quad prefix anchored at the start of the line
pub fn ipv4_prefix(line: &str) -> Option<&str> {
    IPV4_PREFIX.find(line).map(|m| m.as_str())
}
