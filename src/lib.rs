//! # convo-search
//!
//! A TF-IDF search engine and MCP-style tool server for archived chat
//! conversations.
//!
//! convo-search loads a two-level archive of XML conversation exports
//! (`<community>/<year>/*.xml`), flattens each conversation into a single
//! searchable document, fits a TF-IDF index over the corpus once at
//! startup, and answers free-text queries with ranked, optionally filtered
//! results via a CLI and an MCP-compatible HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │    Loader    │──▶│    Corpus    │──▶│ TF-IDF Index │
//! │  community/  │   │ docs + meta  │   │  fit once,   │
//! │  year/*.xml  │   │  (aligned)   │   │  then query  │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │
//!                          ┌───────────────────┤
//!                          ▼                   ▼
//!                     ┌──────────┐       ┌──────────┐
//!                     │   CLI    │       │   HTTP   │
//!                     │ (convo)  │       │  (MCP)   │
//!                     └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! convo stats                                  # inspect the dataset
//! convo search "borrow checker fight"          # ranked search
//! convo search "gc pauses" --community python --year 2021
//! convo digest "incident postmortem" --limit 3 # digest of top results
//! convo serve mcp                              # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Archive walking and XML record parsing |
//! | [`corpus`] | Conversation flattening, aligned docs + metadata |
//! | [`tfidf`] | Tokenizer, vocabulary fitting, TF-IDF weights, cosine |
//! | [`search`] | Filtered, ranked retrieval |
//! | [`digest`] | Plain-text digest rendering |
//! | [`server`] | MCP HTTP server |
//! | [`stats`] | Corpus statistics |

pub mod config;
pub mod corpus;
pub mod digest;
pub mod loader;
pub mod models;
pub mod search;
pub mod server;
pub mod stats;
pub mod tfidf;
