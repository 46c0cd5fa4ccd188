pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "runnel")]
#[command(about = "A feed reader for RSS, Atom and JSON Feed", long_about = None)]
pub struct Cli {
    /// Number of parallel workers for fetching feeds (overrides config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Path to the database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and add a new source
    Add {
        /// URL of the feed to add
        url: String,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Rename a source or point it at a new URL
    Edit {
        /// Source id
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Remove a source
    Remove {
        /// Source id
        id: String,
    },
    /// Move a source to a new position in the list
    Move { from: usize, to: usize },
    /// Refresh all sources
    Update,
    /// List sources or items
    List {
        /// Show items instead of sources
        #[arg(long)]
        items: bool,
        /// Only starred items
        #[arg(long, requires = "items")]
        starred: bool,
        /// Only items from this source id
        #[arg(long, requires = "items", conflicts_with = "starred")]
        source: Option<String>,
    },
    /// Mark an item read (by id or link)
    Read { key: String },
    /// Mark every cached item read
    ReadAll,
    /// Toggle the star on an item (by id or link)
    Star { key: String },
    /// Drop every cached item that is not starred
    ClearCache,
    /// Forget all read marks
    ClearRead,
    /// Forget all stars
    ClearStarred,
}
