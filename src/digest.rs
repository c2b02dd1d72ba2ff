//! Digest rendering for search results.
//!
//! Turns a batch of search results into a short plain-text digest: a fixed
//! header followed by one block per result with the community, the year,
//! and a truncated excerpt of the conversation. The tool server also feeds
//! this module result objects that arrived as JSON; [`parse_results`]
//! validates those before rendering.

use anyhow::Result;
use serde_json::Value;

use crate::config::Config;
use crate::models::SearchResult;
use crate::search::{self, SearchError};

/// First line of every digest.
pub const DIGEST_HEADER: &str = "Summary of top conversations:";

// ============ Errors ============

/// A result object handed to the digest was missing required structure.
#[derive(Debug)]
pub struct MalformedResultError {
    pub detail: String,
}

impl std::fmt::Display for MalformedResultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed result object: {}", self.detail)
    }
}

impl std::error::Error for MalformedResultError {}

// ============ Rendering ============

/// Renders the digest for `results`, truncating each conversation to
/// `max_chars` characters.
///
/// The ellipsis is appended unconditionally, short conversations included.
/// An empty batch renders the header alone.
pub fn summarize(results: &[SearchResult], max_chars: usize) -> String {
    let blocks: Vec<String> = results
        .iter()
        .map(|result| {
            format!(
                "Community: {}, Year: {}\n{}...",
                result.metadata.community,
                result.metadata.year,
                take_chars(&result.content, max_chars)
            )
        })
        .collect();
    format!("{}\n{}", DIGEST_HEADER, blocks.join("\n"))
}

/// First `max_chars` characters of `text`, on a char boundary.
fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Validates externally supplied result objects into [`SearchResult`]s.
///
/// Every object must carry `score`, `content`, and a complete `metadata`
/// block; anything missing or mistyped fails with the serde detail so the
/// caller can report which field was at fault.
pub fn parse_results(values: &[Value]) -> Result<Vec<SearchResult>, MalformedResultError> {
    values
        .iter()
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| MalformedResultError {
                detail: e.to_string(),
            })
        })
        .collect()
}

// ============ CLI ============

/// CLI entry point for `convo digest`: search, then print the digest.
pub fn run_digest(
    config: &Config,
    query: &str,
    community: Option<String>,
    year: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let engine = search::build_engine(config)?;
    let top_n = limit.unwrap_or(config.retrieval.default_top_n);

    let results = match engine.search(query, community.as_deref(), year.as_deref(), top_n) {
        Ok(results) => results,
        Err(SearchError::EmptyResultSet) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!("{}", summarize(&results, config.digest.max_chars));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationMeta;
    use serde_json::json;

    fn result(community: &str, year: &str, content: &str) -> SearchResult {
        SearchResult {
            score: 0.5,
            content: content.to_string(),
            metadata: ConversationMeta {
                community: community.to_string(),
                year: year.to_string(),
                conversation_id: "c1".to_string(),
            },
        }
    }

    #[test]
    fn digest_has_header_and_one_block_per_result() {
        let results = vec![
            result("rust", "2021", "first conversation"),
            result("python", "2022", "second conversation"),
        ];
        let digest = summarize(&results, 300);
        assert_eq!(
            digest,
            "Summary of top conversations:\n\
             Community: rust, Year: 2021\nfirst conversation...\n\
             Community: python, Year: 2022\nsecond conversation..."
        );
    }

    #[test]
    fn empty_batch_renders_header_alone() {
        assert_eq!(summarize(&[], 300), "Summary of top conversations:\n");
    }

    #[test]
    fn ellipsis_is_appended_even_when_nothing_was_truncated() {
        let digest = summarize(&[result("a", "2020", "hi")], 300);
        assert!(digest.ends_with("hi..."));
    }

    #[test]
    fn long_conversations_are_cut_at_max_chars() {
        let long = "x".repeat(400);
        let digest = summarize(&[result("a", "2020", &long)], 300);
        let expected = format!("{}...", "x".repeat(300));
        assert!(digest.ends_with(&expected));
        assert!(!digest.contains(&"x".repeat(301)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "héllo wörld";
        assert_eq!(take_chars(text, 5), "héllo");
        assert_eq!(take_chars(text, 100), text);
    }

    #[test]
    fn parse_results_accepts_well_formed_objects() {
        let values = vec![json!({
            "score": 0.8312,
            "content": "alpha beta",
            "metadata": {
                "community": "rust",
                "year": "2021",
                "conversation_id": "c1"
            }
        })];
        let parsed = parse_results(&values).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].metadata.community, "rust");
        assert_eq!(parsed[0].score, 0.8312);
    }

    #[test]
    fn parse_results_rejects_missing_score() {
        let values = vec![json!({
            "content": "alpha beta",
            "metadata": {
                "community": "rust",
                "year": "2021",
                "conversation_id": "c1"
            }
        })];
        let err = parse_results(&values).unwrap_err();
        assert!(err.detail.contains("score"), "detail: {}", err.detail);
    }

    #[test]
    fn parse_results_rejects_incomplete_metadata() {
        let values = vec![json!({
            "score": 0.5,
            "content": "alpha beta",
            "metadata": { "community": "rust" }
        })];
        assert!(parse_results(&values).is_err());
    }

    #[test]
    fn parse_results_rejects_non_objects() {
        let values = vec![json!("just a string")];
        assert!(parse_results(&values).is_err());
    }
}
