//! TF-IDF vector index with English stop-word removal.
//!
//! The index is fitted once over the full document set and is immutable
//! afterwards. [`TfidfIndex::transform`] projects arbitrary text (queries or
//! filtered document subsets) into the fitted space without re-fitting, so
//! scores stay comparable across filtered and unfiltered searches.
//!
//! Vectors are sparse, non-negative `(column, weight)` pairs sorted by
//! column. Weights are raw term frequency times a smoothed inverse document
//! frequency, `ln((1 + n) / (1 + df)) + 1`. Rows are not length-normalized;
//! [`cosine_similarity`] divides by both magnitudes at scoring time, which
//! yields the same scores.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Classic English stop list, alphabetically sorted for binary search.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together",
    "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercases `text` and splits it into index terms.
///
/// Terms are maximal runs of alphanumeric characters or `_` at least two
/// characters long; stop words are discarded.
fn analyze(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// A sparse weighted-term vector: `(column, weight)` pairs sorted by column.
pub type SparseVector = Vec<(u32, f64)>;

// ============ Errors ============

/// Error returned by [`TfidfIndex::fit`] when given zero documents.
///
/// A weighting fit cannot be performed over an empty collection; callers
/// must guarantee at least one document exists before indexing.
#[derive(Debug)]
pub struct EmptyCorpusError;

impl std::fmt::Display for EmptyCorpusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot fit a vocabulary over an empty corpus")
    }
}

impl std::error::Error for EmptyCorpusError {}

// ============ Index ============

/// A fitted TF-IDF vocabulary and the weighted-term matrix it produced.
///
/// Immutable once built. The vocabulary is frozen at fit time; transforming
/// text with out-of-vocabulary terms simply contributes nothing for them.
#[derive(Debug)]
pub struct TfidfIndex {
    /// Term → column id, assigned in sorted term order.
    vocabulary: HashMap<String, u32>,
    /// Smoothed inverse document frequency per column.
    idf: Vec<f64>,
    /// One sparse row per fitted document, in input order.
    matrix: Vec<SparseVector>,
}

impl TfidfIndex {
    /// Builds the vocabulary and weighted-term matrix from `docs`.
    ///
    /// A corpus whose documents contain only stop words fits successfully
    /// with an empty vocabulary (every vector is empty and all similarities
    /// are 0); only a corpus with zero documents is an error.
    pub fn fit(docs: &[String]) -> Result<TfidfIndex, EmptyCorpusError> {
        if docs.is_empty() {
            return Err(EmptyCorpusError);
        }

        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| analyze(d)).collect();

        // Document frequency per term; BTreeMap so column ids follow sorted
        // term order.
        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = docs.len() as f64;
        let vocabulary: HashMap<String, u32> = doc_freq
            .keys()
            .enumerate()
            .map(|(col, term)| (term.to_string(), col as u32))
            .collect();
        let idf: Vec<f64> = doc_freq
            .values()
            .map(|&df| ((1.0 + n_docs) / (1.0 + f64::from(df))).ln() + 1.0)
            .collect();

        let matrix = tokenized
            .iter()
            .map(|tokens| weigh(tokens, &vocabulary, &idf))
            .collect();

        Ok(TfidfIndex {
            vocabulary,
            idf,
            matrix,
        })
    }

    /// Projects arbitrary text into the fitted vector space.
    ///
    /// Deterministic: identical input always yields an identical vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        weigh(&analyze(text), &self.vocabulary, &self.idf)
    }

    /// [`transform`](Self::transform) applied to each text in order.
    pub fn transform_many(&self, texts: &[&str]) -> Vec<SparseVector> {
        texts.iter().map(|t| self.transform(t)).collect()
    }

    /// The weighted-term matrix fitted at construction, one row per document.
    pub fn matrix(&self) -> &[SparseVector] {
        &self.matrix
    }

    /// Number of distinct terms in the fitted vocabulary.
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Builds one sparse TF-IDF row from pre-analyzed tokens.
fn weigh(tokens: &[String], vocabulary: &HashMap<String, u32>, idf: &[f64]) -> SparseVector {
    let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
    for token in tokens {
        if let Some(&col) = vocabulary.get(token) {
            *counts.entry(col).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(col, tf)| (col, f64::from(tf) * idf[col as usize]))
        .collect()
}

// ============ Similarity ============

/// Cosine of the angle between two sparse vectors.
///
/// Defined as `0.0` when either vector has zero magnitude (no term overlap
/// with the vocabulary, or empty text) rather than failing.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    let norm_a: f64 = a.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;
    if denom < f64::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn analyze_lowercases_and_drops_short_tokens() {
        let tokens = analyze("A quick-Fix: v2 of the parser_core!");
        assert_eq!(tokens, vec!["quick", "fix", "v2", "parser_core"]);
    }

    #[test]
    fn analyze_removes_stop_words() {
        let tokens = analyze("this is about the deployment and nothing else");
        assert_eq!(tokens, vec!["deployment"]);
    }

    #[test]
    fn fit_empty_corpus_errors() {
        let err = TfidfIndex::fit(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot fit a vocabulary over an empty corpus"
        );
    }

    #[test]
    fn fit_all_stop_words_yields_empty_vocabulary() {
        let index = TfidfIndex::fit(&docs(&["the and of", "is are was"])).unwrap();
        assert_eq!(index.vocabulary_len(), 0);
        assert!(index.matrix().iter().all(|row| row.is_empty()));
        assert_eq!(
            cosine_similarity(&index.transform("the"), &index.matrix()[0]),
            0.0
        );
    }

    #[test]
    fn transform_is_deterministic() {
        let index = TfidfIndex::fit(&docs(&["alpha beta", "beta gamma"])).unwrap();
        let first = index.transform("alpha beta beta");
        let second = index.transform("alpha beta beta");
        assert_eq!(first, second);
    }

    #[test]
    fn transform_ignores_out_of_vocabulary_terms() {
        let index = TfidfIndex::fit(&docs(&["alpha beta"])).unwrap();
        assert!(index.transform("zeppelin").is_empty());
        assert_eq!(
            index.transform("alpha zeppelin"),
            index.transform("alpha")
        );
    }

    #[test]
    fn self_similarity_is_one_for_in_vocabulary_text() {
        let index = TfidfIndex::fit(&docs(&["alpha beta", "beta gamma"])).unwrap();
        let vec = index.transform("alpha beta");
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_vectors_are_orthogonal() {
        let index = TfidfIndex::fit(&docs(&["alpha beta", "gamma delta"])).unwrap();
        let a = index.transform("alpha");
        let b = index.transform("gamma");
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn empty_vector_similarity_is_zero() {
        let index = TfidfIndex::fit(&docs(&["alpha beta"])).unwrap();
        let empty = index.transform("");
        let full = index.transform("alpha");
        assert_eq!(cosine_similarity(&empty, &full), 0.0);
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn rare_terms_outweigh_common_terms() {
        // "shared" appears in every document, "unique" in one.
        let index = TfidfIndex::fit(&docs(&[
            "shared unique",
            "shared filler",
            "shared other",
        ]))
        .unwrap();
        let row = &index.matrix()[0];
        let weight = |term: &str| {
            let col = index.vocabulary[term];
            row.iter().find(|(c, _)| *c == col).map(|(_, w)| *w)
        };
        let shared = weight("shared").unwrap();
        let unique = weight("unique").unwrap();
        assert!(
            unique > shared,
            "expected idf to favor the rarer term: unique={}, shared={}",
            unique,
            shared
        );
    }

    #[test]
    fn rows_are_sorted_by_column() {
        let index = TfidfIndex::fit(&docs(&["gamma alpha beta gamma"])).unwrap();
        for row in index.matrix() {
            assert!(row.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }

    #[test]
    fn stop_list_is_sorted_for_binary_search() {
        assert!(ENGLISH_STOP_WORDS.windows(2).all(|w| w[0] < w[1]));
        assert!(is_stop_word("the"));
        assert!(is_stop_word("yourselves"));
        assert!(!is_stop_word("deployment"));
    }
}
