//! Query input
//!
//! Queries arrive one per line. A leading wildcard label is dropped so that
//! `*.example.com` searches for `example.com`.

use crate::error::Result;
use crate::extract::strip_wildcard;
use crate::types::Query;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Normalize one raw query
///
/// Only a trailing `\r` and one leading `*.` are removed; surrounding spaces are
/// part of the query.
pub fn clean_query(raw: &str) -> Query {
    strip_wildcard(strip_carriage_return(raw)).to_string()
}

/// Read every non-empty line of `reader` as a query, in input order
pub async fn read_queries<R>(reader: R) -> Result<Vec<Query>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut queries = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if strip_carriage_return(&line).is_empty() {
            continue;
        }
        queries.push(clean_query(&line));
    }
    Ok(queries)
}

fn strip_carriage_return(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("*.example.com"), "example.com");
        assert_eq!(clean_query("example.com"), "example.com");
        assert_eq!(clean_query("example.org\r"), "example.org");
        assert_eq!(clean_query("  *.example.com\r"), "  *.example.com");
        assert_eq!(clean_query(" -- ["), " -- [");
        assert_eq!(clean_query("*.*.example.com"), "*.example.com");
    }

    #[tokio::test]
    async fn test_read_queries_skips_empty_lines() {
        let input: &[u8] = b"*.example.com\n\n\r\nexample.org\r\ntesla\n";
        let queries = read_queries(input).await.unwrap();
        assert_eq!(queries, vec!["example.com", "example.org", "tesla"]);
    }

    #[tokio::test]
    async fn test_read_queries_keeps_surrounding_spaces() {
        let input: &[u8] = b" -- [\n  *.example.com\n   \n";
        let queries = read_queries(input).await.unwrap();
        assert_eq!(queries, vec![" -- [", "  *.example.com", "   "]);
    }

    #[tokio::test]
    async fn test_read_queries_empty_input() {
        let input: &[u8] = b"";
        assert!(read_queries(input).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_queries_last_line_without_newline() {
        let input: &[u8] = b"a.com\nb.com";
        assert_eq!(read_queries(input).await.unwrap(), vec!["a.com", "b.com"]);
    }
}
