//! # Runnel
//!
//! A feed-ingestion engine: it fetches RSS, Atom and JSON Feed sources,
//! normalizes them into one item model, and keeps a persistent cache with
//! stable item identity across refreshes.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Document → Normalizer → Merge → Store
//! ```
//!
//! - [`fetcher`]: HTTP client and the bounded-concurrency batch fetcher
//! - [`document`]: Typed RSS/Atom/JSON Feed documents
//! - [`normalizer`]: Converts documents into unified [`Item`](domain::Item)s
//! - [`merge`]: Reconciles fresh items with the cache
//! - [`store`]: SQLite persistence of the four aggregates
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a source
//! runnel add https://blog.rust-lang.org/feed.xml --name "Rust Blog"
//!
//! # Refresh everything
//! runnel update
//!
//! # Show cached items
//! runnel list --items
//! ```

/// Application context, the reader and error handling.
///
/// [`FeedReader`](app::FeedReader) owns sources, the item cache and
/// read/starred state; [`AppContext`](app::AppContext) wires the store,
/// fetcher and normalizer it runs on.
pub mod app;

/// Command-line interface using clap.
///
/// - `add <url>` / `edit <id>` / `remove <id>` / `move <from> <to>`
/// - `update` - Refresh all sources
/// - `list [--items]` - List sources or items
/// - `read`, `read-all`, `star` and the `clear-*` commands
pub mod cli;

/// Configuration loaded from `~/.config/runnel/config.toml`.
pub mod config;

/// Format detection and typed feed documents.
pub mod document;

/// Core domain models.
///
/// - [`Source`](domain::Source): A subscribed feed URL
/// - [`Item`](domain::Item): A normalized entry with a stable key
/// - [`KeySet`](domain::KeySet): Read/starred marks
pub mod domain;

/// Fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for raw body retrieval
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// Identity-preserving merge of fresh items into the cache.
pub mod merge;

/// Item normalization: titles, links, summaries and image selection.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining load/save of each aggregate
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
