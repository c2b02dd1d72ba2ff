//! Corpus statistics and health overview.
//!
//! Provides a quick summary of what's indexed: community and conversation
//! counts, how many conversations produced documents, and the fitted
//! vocabulary size. Used by `convo stats` to give confidence that the
//! dataset on disk parses the way the server will see it.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::loader;
use crate::tfidf::TfidfIndex;

/// Per-community breakdown of conversation and document counts.
#[derive(Default)]
struct CommunityStats {
    years: usize,
    conversations: usize,
    documents: usize,
}

/// Run the stats command: load the dataset and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let dataset = loader::load_dataset(&config.dataset.root)?;
    let corpus = Corpus::from_dataset(&dataset);

    let mut total_conversations = 0usize;
    let mut per_community: BTreeMap<&str, CommunityStats> = BTreeMap::new();
    for (community, years) in &dataset {
        let entry = per_community.entry(community).or_default();
        entry.years = years.len();
        for conversations in years.values() {
            entry.conversations += conversations.len();
            total_conversations += conversations.len();
        }
    }
    for meta in &corpus.meta {
        if let Some(entry) = per_community.get_mut(meta.community.as_str()) {
            entry.documents += 1;
        }
    }

    let dropped = total_conversations - corpus.len();
    let vocabulary = match TfidfIndex::fit(&corpus.docs) {
        Ok(index) => index.vocabulary_len(),
        Err(_) => 0,
    };

    println!("convo-search — Corpus Stats");
    println!("===========================");
    println!();
    println!("  Dataset:       {}", config.dataset.root.display());
    println!();
    println!("  Communities:   {}", dataset.len());
    println!("  Conversations: {}", total_conversations);
    println!(
        "  Documents:     {} ({} dropped as empty)",
        corpus.len(),
        dropped
    );
    println!("  Vocabulary:    {} terms", vocabulary);

    if !per_community.is_empty() {
        println!();
        println!("  By community:");
        println!(
            "  {:<24} {:>6} {:>14} {:>10}",
            "COMMUNITY", "YEARS", "CONVERSATIONS", "DOCUMENTS"
        );
        println!("  {}", "-".repeat(58));

        for (community, stats) in &per_community {
            println!(
                "  {:<24} {:>6} {:>14} {:>10}",
                community, stats.years, stats.conversations, stats.documents
            );
        }
    }

    println!();

    Ok(())
}
