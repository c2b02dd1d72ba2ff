//! End-to-end tests for the loader → corpus → engine pipeline.
//!
//! These tests write a real two-level archive (community/year/*.xml) to a
//! temporary directory and prove that parsing, flattening, fitting, and
//! ranked retrieval work together against the public API.

use std::fs;
use std::path::Path;

use convo_search::corpus::Corpus;
use convo_search::digest::{summarize, DIGEST_HEADER};
use convo_search::loader::load_dataset;
use convo_search::search::{SearchEngine, SearchError};
use tempfile::TempDir;

// ─── Fixture ────────────────────────────────────────────────────────

/// Writes a small archive: two communities, messages out of order, one
/// conversation split across two files, one conversation with no usable
/// text at all.
fn write_archive(root: &Path) {
    let python_2021 = root.join("python").join("2021");
    fs::create_dir_all(&python_2021).unwrap();
    fs::write(
        python_2021.join("chunk_0.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<messages>
  <message conversation_id="py-gc">
    <ts>1612137600.000300</ts>
    <user>U03</user>
    <text>tuning the collector budget helped</text>
  </message>
  <message conversation_id="py-gc">
    <ts>1612137600.000100</ts>
    <user>U01</user>
    <text>our gc pauses spiked overnight</text>
  </message>
  <message conversation_id="py-gc">
    <ts>1612137600.000200</ts>
    <user>U02</user>
    <text>  which collector version?  </text>
  </message>
  <message conversation_id="py-empty">
    <ts>1612137600.000400</ts>
    <user>U04</user>
    <text>   </text>
  </message>
  <message conversation_id="py-empty">
    <ts>1612137600.000500</ts>
    <user>U05</user>
  </message>
</messages>
"#,
    )
    .unwrap();

    let rust_2021 = root.join("rust").join("2021");
    fs::create_dir_all(&rust_2021).unwrap();
    fs::write(
        rust_2021.join("chunk_0.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<messages>
  <message conversation_id="rs-borrow">
    <ts>1609459200.000100</ts>
    <user>U10</user>
    <text>fighting the borrow checker again</text>
  </message>
</messages>
"#,
    )
    .unwrap();
    fs::write(
        rust_2021.join("chunk_1.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<messages>
  <message conversation_id="rs-borrow">
    <ts>1609459200.000200</ts>
    <user>U11</user>
    <text>lifetimes on the trait object fixed it</text>
  </message>
</messages>
"#,
    )
    .unwrap();

    let rust_2022 = root.join("rust").join("2022");
    fs::create_dir_all(&rust_2022).unwrap();
    fs::write(
        rust_2022.join("chunk_0.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<messages>
  <message conversation_id="rs-async">
    <ts>1640995200.000100</ts>
    <user>U12</user>
    <text>async cancellation bug in the executor</text>
  </message>
</messages>
"#,
    )
    .unwrap();
}

fn load_fixture() -> (TempDir, Corpus) {
    let tmp = TempDir::new().unwrap();
    write_archive(tmp.path());
    let dataset = load_dataset(tmp.path()).unwrap();
    let corpus = Corpus::from_dataset(&dataset);
    (tmp, corpus)
}

// ─── Loading and flattening ─────────────────────────────────────────

#[test]
fn archive_layout_maps_to_communities_and_years() {
    let tmp = TempDir::new().unwrap();
    write_archive(tmp.path());

    let dataset = load_dataset(tmp.path()).unwrap();
    assert_eq!(dataset.len(), 2);
    assert!(dataset.contains_key("python"));
    assert!(dataset.contains_key("rust"));
    assert_eq!(dataset["rust"].len(), 2, "rust has 2021 and 2022");
    assert_eq!(dataset["python"]["2021"].len(), 2, "py-gc and py-empty");
}

/// Only `*.xml` files exactly two levels below the root are record files;
/// stray files at other depths or with other extensions never load, even
/// when their content is a well-formed message log.
#[test]
fn stray_files_outside_the_record_layout_are_ignored() {
    let tmp = TempDir::new().unwrap();
    write_archive(tmp.path());

    let stray = r#"<?xml version="1.0" encoding="UTF-8"?>
<messages>
  <message conversation_id="stray">
    <ts>1</ts>
    <user>U99</user>
    <text>should never be indexed</text>
  </message>
</messages>
"#;
    // Well-formed records at the wrong depths.
    fs::write(tmp.path().join("top.xml"), stray).unwrap();
    fs::write(tmp.path().join("python").join("mid.xml"), stray).unwrap();
    let nested = tmp.path().join("python").join("2021").join("extra");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("deep.xml"), stray).unwrap();
    // Right depth, wrong extension.
    fs::write(
        tmp.path().join("python").join("2021").join("notes.txt"),
        stray,
    )
    .unwrap();

    let dataset = load_dataset(tmp.path()).unwrap();
    let ids: Vec<&str> = dataset
        .values()
        .flat_map(|years| years.values())
        .flat_map(|conversations| conversations.keys())
        .map(String::as_str)
        .collect();
    assert!(!ids.contains(&"stray"), "got: {:?}", ids);
    assert_eq!(ids.len(), 4, "py-gc, py-empty, rs-borrow, rs-async");
}

/// Messages land in all kinds of orders in the export files; the document
/// must read in timestamp order regardless.
#[test]
fn documents_read_in_timestamp_order() {
    let (_tmp, corpus) = load_fixture();

    let idx = corpus
        .meta
        .iter()
        .position(|m| m.conversation_id == "py-gc")
        .unwrap();
    assert_eq!(
        corpus.docs[idx],
        "our gc pauses spiked overnight which collector version? tuning the collector budget helped"
    );
}

#[test]
fn conversation_split_across_files_is_merged() {
    let (_tmp, corpus) = load_fixture();

    let idx = corpus
        .meta
        .iter()
        .position(|m| m.conversation_id == "rs-borrow")
        .unwrap();
    assert_eq!(
        corpus.docs[idx],
        "fighting the borrow checker again lifetimes on the trait object fixed it"
    );
}

/// A conversation whose messages carry no usable text produces no document,
/// so it can never surface in search results.
#[test]
fn textless_conversations_are_dropped_from_the_corpus() {
    let (_tmp, corpus) = load_fixture();

    assert_eq!(corpus.len(), 3);
    assert!(corpus
        .meta
        .iter()
        .all(|m| m.conversation_id != "py-empty"));
}

#[test]
fn docs_and_meta_stay_aligned() {
    let (_tmp, corpus) = load_fixture();

    assert_eq!(corpus.docs.len(), corpus.meta.len());
    for (doc, meta) in corpus.docs.iter().zip(&corpus.meta) {
        if meta.conversation_id == "rs-async" {
            assert_eq!(meta.community, "rust");
            assert_eq!(meta.year, "2022");
            assert!(doc.contains("cancellation"));
        }
    }
}

// ─── Ranked retrieval ───────────────────────────────────────────────

#[test]
fn query_terms_rank_the_right_conversation_first() {
    let (_tmp, corpus) = load_fixture();
    let engine = SearchEngine::new(corpus).unwrap();

    let results = engine.search("gc pauses", None, None, 3).unwrap();
    assert_eq!(results[0].metadata.conversation_id, "py-gc");
    assert!(results[0].score > 0.0);
}

#[test]
fn community_and_year_filters_narrow_the_candidates() {
    let (_tmp, corpus) = load_fixture();
    let engine = SearchEngine::new(corpus).unwrap();

    let results = engine
        .search("bug", Some("rust"), Some("2022"), 10)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.conversation_id, "rs-async");
}

#[test]
fn filter_matching_nothing_is_reported_as_empty_result_set() {
    let (_tmp, corpus) = load_fixture();
    let engine = SearchEngine::new(corpus).unwrap();

    let err = engine.search("bug", Some("erlang"), None, 10).unwrap_err();
    assert!(matches!(err, SearchError::EmptyResultSet));
}

#[test]
fn repeated_searches_return_identical_results() {
    let (_tmp, corpus) = load_fixture();
    let engine = SearchEngine::new(corpus).unwrap();

    let first = engine.search("collector", None, None, 3).unwrap();
    let second = engine.search("collector", None, None, 3).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.score, b.score);
        assert_eq!(a.metadata, b.metadata);
    }
}

// ─── Digest over live results ───────────────────────────────────────

#[test]
fn digest_of_search_results_renders_header_and_blocks() {
    let (_tmp, corpus) = load_fixture();
    let engine = SearchEngine::new(corpus).unwrap();

    let results = engine.search("gc pauses", None, None, 2).unwrap();
    let digest = summarize(&results, 300);

    assert!(digest.starts_with(DIGEST_HEADER));
    assert!(digest.contains("Community: python, Year: 2021"));
    assert!(digest.contains("our gc pauses spiked overnight"));
    assert!(digest.ends_with("..."));
}
