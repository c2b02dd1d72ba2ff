//! # convo-search CLI (`convo`)
//!
//! The `convo` binary is the primary interface for convo-search. It provides
//! commands for ranked conversation search, digest rendering, corpus
//! statistics, and starting the MCP server.
//!
//! ## Usage
//!
//! ```bash
//! convo --config ./config/convo.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `convo search "<query>"` | Rank conversations against a query |
//! | `convo digest "<query>"` | Print a digest of the top results |
//! | `convo stats` | Print corpus statistics |
//! | `convo serve mcp` | Start the MCP-compatible HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect what was loaded from the archive
//! convo stats --config ./config/convo.toml
//!
//! # Ranked search over every community
//! convo search "borrow checker fight" --config ./config/convo.toml
//!
//! # Restrict to one community and year
//! convo search "gc pauses" --community python --year 2021
//!
//! # Digest of the top three results
//! convo digest "incident postmortem" --limit 3
//!
//! # Start MCP server for Cursor integration
//! convo serve mcp --config ./config/convo.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use convo_search::{config, digest, search, server, stats};

/// convo-search CLI — TF-IDF search and digest tools over archived chat
/// conversations.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/convo.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "convo",
    about = "convo-search — TF-IDF search and an MCP tool server over archived chat conversations",
    version,
    long_about = "convo-search loads a two-level archive of XML conversation exports \
    (community/year/*.xml), fits a TF-IDF index over the flattened conversations, and exposes \
    ranked search and digest rendering via a CLI and an MCP-compatible HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/convo.toml`. The dataset root, retrieval,
    /// digest, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/convo.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Search archived conversations.
    ///
    /// Ranks every conversation in the corpus against the query by TF-IDF
    /// cosine similarity and prints the top results with scores and
    /// excerpts. Filters narrow the candidate set before ranking.
    Search {
        /// The search query string.
        query: String,

        /// Restrict results to one community (top-level archive directory).
        #[arg(long)]
        community: Option<String>,

        /// Restrict results to one year (second-level archive directory).
        #[arg(long)]
        year: Option<String>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print a plain-text digest of the top results for a query.
    ///
    /// Runs the same ranked search as `convo search`, then renders the
    /// digest: one block per result with community, year, and a truncated
    /// excerpt of the conversation.
    Digest {
        /// The search query string.
        query: String,

        /// Restrict results to one community (top-level archive directory).
        #[arg(long)]
        community: Option<String>,

        /// Restrict results to one year (second-level archive directory).
        #[arg(long)]
        year: Option<String>,

        /// Maximum number of results to include.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print corpus statistics.
    ///
    /// Loads the dataset and reports community, conversation, document,
    /// and vocabulary counts without starting the server.
    Stats,

    /// Start the MCP-compatible HTTP server.
    ///
    /// Exposes conversation search and digest rendering via a JSON API for
    /// integration with Cursor, Claude, and other MCP-compatible AI tools.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the MCP tool server.
    ///
    /// Fits the search engine over the archive, then binds to the address
    /// configured in `[server].bind` and serves the tool endpoints.
    Mcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            community,
            year,
            limit,
        } => {
            search::run_search(&cfg, &query, community, year, limit)?;
        }
        Commands::Digest {
            query,
            community,
            year,
            limit,
        } => {
            digest::run_digest(&cfg, &query, community, year, limit)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Serve { service } => match service {
            ServeService::Mcp => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
