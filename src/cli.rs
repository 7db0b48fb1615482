//! CLI argument definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::pipeline::Granularity;

/// Top-level CLI parser for `portguide`.
#[derive(Debug, Parser)]
#[command(
    name = "portguide",
    version,
    about = "Generate a migration guide for a GitHub repository with an LLM"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl a repository and write its migration guide.
    Migrate {
        /// Repository owner (user or organisation).
        #[arg(long)]
        owner: String,
        /// Repository name.
        #[arg(long)]
        repo: String,
        /// Language the repository is written in.
        #[arg(long = "from")]
        source_language: String,
        /// Language to migrate to.
        #[arg(long = "to")]
        target_language: String,
        /// Where to write the guide (defaults to the document's own name).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Characters per chunk; overrides `PORTGUIDE_CHUNK_SIZE`.
        #[arg(long)]
        chunk_size: Option<usize>,
        /// `chunk` or `file`; overrides `PORTGUIDE_GRANULARITY`.
        #[arg(long)]
        granularity: Option<Granularity>,
    },
    /// Serve the migration endpoint over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}
