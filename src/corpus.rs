//! Document construction: conversations become flattened searchable texts.
//!
//! The corpus is an index-aligned pair of parallel sequences: `docs[i]`
//! pairs with `meta[i]` for all `i`. Every operation that filters or
//! reorders must keep both sequences in lockstep; filtering goes through
//! [`CorpusView::retain`], which returns a new aligned pair.

use crate::models::{ConversationMeta, Dataset, Message};

/// Flattens one conversation's messages into a single searchable text.
///
/// Messages are stable-sorted by timestamp string ascending (ties keep
/// encounter order), messages whose text is absent or whitespace-only are
/// skipped, and the surviving texts are trimmed and joined with single
/// spaces. Returns `None` when nothing survives; such conversations produce
/// no document, which is an expected outcome rather than an error.
pub fn flatten_conversation(messages: &[Message]) -> Option<String> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by(|a, b| a.ts.cmp(&b.ts));

    let texts: Vec<&str> = ordered
        .iter()
        .filter_map(|m| m.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join(" "))
    }
}

/// The full aligned collection of documents and their attributes.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub docs: Vec<String>,
    pub meta: Vec<ConversationMeta>,
}

impl Corpus {
    /// Builds the corpus from a loaded dataset.
    ///
    /// Conversations are visited in the dataset's deterministic map order,
    /// so the corpus (and therefore tie-broken result order) is reproducible
    /// across runs.
    pub fn from_dataset(dataset: &Dataset) -> Corpus {
        let mut corpus = Corpus::default();
        for (community, years) in dataset {
            for (year, conversations) in years {
                for (conversation_id, messages) in conversations {
                    if let Some(text) = flatten_conversation(messages) {
                        corpus.docs.push(text);
                        corpus.meta.push(ConversationMeta {
                            community: community.clone(),
                            year: year.clone(),
                            conversation_id: conversation_id.clone(),
                        });
                    }
                }
            }
        }
        corpus
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Borrowed view over the whole corpus, the starting point for filtering.
    pub fn view(&self) -> CorpusView<'_> {
        CorpusView {
            docs: self.docs.iter().map(String::as_str).collect(),
            meta: self.meta.iter().collect(),
        }
    }
}

/// A borrowed, index-aligned subset of a [`Corpus`].
#[derive(Debug, Clone)]
pub struct CorpusView<'a> {
    pub docs: Vec<&'a str>,
    pub meta: Vec<&'a ConversationMeta>,
}

impl<'a> CorpusView<'a> {
    /// Keeps only the entries whose metadata satisfies `pred`, preserving
    /// relative order and the docs/meta alignment. An empty result is valid;
    /// callers decide whether that is an error.
    pub fn retain<F>(self, pred: F) -> CorpusView<'a>
    where
        F: Fn(&ConversationMeta) -> bool,
    {
        let mut docs = Vec::new();
        let mut meta = Vec::new();
        for (doc, m) in self.docs.into_iter().zip(self.meta) {
            if pred(m) {
                docs.push(doc);
                meta.push(m);
            }
        }
        CorpusView { docs, meta }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
