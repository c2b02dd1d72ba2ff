//! Query-time ranking over the fitted corpus.
//!
//! A [`SearchEngine`] owns the corpus and the TF-IDF index fitted over it at
//! startup; both are read-only afterwards, so the engine can be shared
//! across concurrent queries without locking. Each search filters a
//! borrowed corpus view, projects the candidates into the fitted vector
//! space, scores them by cosine similarity, and returns the top results.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::corpus::Corpus;
use crate::loader;
use crate::models::SearchResult;
use crate::tfidf::{cosine_similarity, EmptyCorpusError, SparseVector, TfidfIndex};

// ============ Errors ============

/// Errors surfaced by the search engine.
#[derive(Debug)]
pub enum SearchError {
    /// The corpus had no documents at fit time. Fatal at startup.
    EmptyCorpus,
    /// The requested filters matched no documents. Recoverable; operation
    /// boundaries map this to an empty result list.
    EmptyResultSet,
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::EmptyCorpus => write!(f, "corpus contains no documents"),
            SearchError::EmptyResultSet => write!(f, "filters matched no documents"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<EmptyCorpusError> for SearchError {
    fn from(_: EmptyCorpusError) -> Self {
        SearchError::EmptyCorpus
    }
}

// ============ Engine ============

/// Immutable search context: the corpus plus the index fitted over it.
#[derive(Debug)]
pub struct SearchEngine {
    corpus: Corpus,
    index: TfidfIndex,
}

impl SearchEngine {
    /// Fits the vector index over the corpus.
    ///
    /// Fails with [`SearchError::EmptyCorpus`] when there is nothing to
    /// index; a process serving queries needs at least one document.
    pub fn new(corpus: Corpus) -> Result<SearchEngine, SearchError> {
        let index = TfidfIndex::fit(&corpus.docs)?;
        Ok(SearchEngine { corpus, index })
    }

    /// Ranks documents against `query`, optionally filtered by community
    /// and/or year.
    ///
    /// Filtered candidates are re-projected into the vector space fitted
    /// over the full corpus (never re-fitted), so filtered and unfiltered
    /// scores stay comparable. Results are ordered by score descending;
    /// ties keep corpus order. Scores are rounded to 4 decimal digits.
    /// `top_n <= 0` yields an empty list; `top_n` beyond the candidate
    /// count yields all candidates.
    pub fn search(
        &self,
        query: &str,
        community: Option<&str>,
        year: Option<&str>,
        top_n: i64,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if top_n <= 0 {
            return Ok(Vec::new());
        }

        let filtered = community.is_some() || year.is_some();
        let mut view = self.corpus.view();
        if let Some(community) = community {
            view = view.retain(|m| m.community == community);
        }
        if let Some(year) = year {
            view = view.retain(|m| m.year == year);
        }
        if view.is_empty() {
            return Err(SearchError::EmptyResultSet);
        }

        // Reuse the fitted matrix when no filter narrowed the view.
        let rows: Vec<SparseVector>;
        let matrix: &[SparseVector] = if filtered {
            rows = self.index.transform_many(&view.docs);
            &rows
        } else {
            self.index.matrix()
        };

        let query_vec = self.index.transform(query);
        let mut scored: Vec<(usize, f64)> = matrix
            .iter()
            .map(|row| cosine_similarity(&query_vec, row))
            .enumerate()
            .collect();

        // Score descending; ties keep corpus order (position ascending).
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_n as usize);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| SearchResult {
                score: round4(score),
                content: view.docs[idx].to_string(),
                metadata: view.meta[idx].clone(),
            })
            .collect())
    }
}

/// Round to 4 decimal digits, the reported score precision.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// ============ Startup ============

/// Loads the dataset, builds the corpus, and fits the engine.
///
/// Shared startup path for the CLI commands and the tool server; an empty
/// corpus aborts here.
pub fn build_engine(config: &Config) -> Result<SearchEngine> {
    let dataset = loader::load_dataset(&config.dataset.root)?;
    let corpus = Corpus::from_dataset(&dataset);
    SearchEngine::new(corpus).with_context(|| {
        format!(
            "no searchable conversations under {}",
            config.dataset.root.display()
        )
    })
}

// ============ CLI ============

/// CLI entry point for `convo search`.
pub fn run_search(
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

    let engine = build_engine(config)?;
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

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} / {} / {}",
            i + 1,
            result.score,
            result.metadata.community,
            result.metadata.year,
            result.metadata.conversation_id
        );
        println!("    excerpt: \"{}\"", excerpt(&result.content, 160));
        println!();
    }

    Ok(())
}

/// Display-level truncation for CLI output.
fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if out.len() < text.len() {
        out.push_str("...");
    }
    out
}
