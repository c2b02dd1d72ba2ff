//! Core data models used throughout convo-search.
//!
//! These types represent the messages, conversations, and search results that
//! flow through the corpus-building and retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single chat message parsed from a record file.
#[derive(Debug, Clone)]
pub struct Message {
    /// Timestamp string as written in the archive. Compared lexicographically,
    /// never parsed into a numeric clock.
    pub ts: String,
    /// Author handle.
    pub user: String,
    /// Message body. `None` when the archive carries no text for this message.
    pub text: Option<String>,
}

/// Nested dataset mapping: community → year → conversation id → messages.
///
/// `BTreeMap` keeps iteration deterministic, which keeps corpus order (and
/// therefore result order for tied scores) reproducible across runs.
pub type Dataset = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<Message>>>>;

/// Identifying attributes of one conversation.
///
/// A conversation id is only unique within its (community, year) scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMeta {
    pub community: String,
    pub year: String,
    pub conversation_id: String,
}

/// A search result returned from the query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Cosine similarity in `[0, 1]`, rounded to 4 decimal digits.
    pub score: f64,
    /// The matched document's full flattened text.
    pub content: String,
    /// The matched document's attributes.
    pub metadata: ConversationMeta,
}
