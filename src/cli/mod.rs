pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "watchpost")]
#[command(about = "Watch channels and pages for new content", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/watchpost/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a content hash for a URL and print new, updated or unchanged
    Check {
        /// Source URL used as the cache key
        url: String,
        /// Content hash to compare against the stored one
        hash: String,
    },
    /// Show cache statistics
    Stats,
    /// Drop every cache entry
    Clear,
    /// Forget one URL
    Remove {
        /// URL to remove from the cache
        url: String,
    },
    /// Print the content hash of a file, or of stdin with "-"
    Hash {
        /// Path to hash, or "-" for stdin
        path: String,
    },
    /// Resolve a channel URL or handle to its channel id
    Resolve {
        /// Channel URL, @handle or channel id
        channel: String,
    },
    /// Fetch the latest items of a channel feed
    Feed {
        /// Channel URL, @handle or channel id
        channel: String,
        /// Show at most this many items
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Render a page in a headless browser and print its records
    Scrape {
        /// Page URL
        url: String,
        /// Show at most this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Check every configured target once
    Run,
}
