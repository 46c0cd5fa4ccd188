//! The reader: sole owner of sources, the item cache and read/starred state.
//!
//! All mutation goes through [`FeedReader`], which keeps its state behind one
//! async mutex. Network work runs without the lock held; fetched results are
//! merged back under it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::app::{AppContext, Result, RunnelError};
use crate::domain::source::sort_by_display_name;
use crate::domain::{FeedFilter, Item, KeySet, Source};
use crate::merge::merge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The refresh ran; `failed` sources were skipped.
    Completed { fetched: usize, failed: usize },
    /// There were no sources to refresh.
    NoSources,
    /// Another refresh was already running; this request was folded into it.
    Coalesced,
}

#[derive(Default)]
struct ReaderState {
    sources: Vec<Source>,
    items: Vec<Item>,
    read: KeySet,
    starred: KeySet,
    filter: FeedFilter,
    is_loading: bool,
    error_message: Option<String>,
}

impl ReaderState {
    fn visible_items(&self) -> Vec<Item> {
        let live: HashSet<Uuid> = self.sources.iter().map(|s| s.id).collect();

        self.items
            .iter()
            // Items of removed sources stay cached but are not shown.
            .filter(|item| item.source_id.is_none_or(|id| live.contains(&id)))
            .filter(|item| match self.filter {
                FeedFilter::All => true,
                FeedFilter::Starred => self.starred.contains(item),
                FeedFilter::Source(id) => item.source_id == Some(id),
            })
            .cloned()
            .collect()
    }
}

/// Clears the in-flight flag when a refresh ends, however it ends.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FeedReader {
    ctx: AppContext,
    state: Mutex<ReaderState>,
    refreshing: AtomicBool,
}

impl FeedReader {
    /// Load all persisted aggregates. Any that fail to load start empty.
    pub fn new(ctx: AppContext) -> Self {
        let store = &ctx.store;
        let mut state = ReaderState {
            sources: load_or_default("sources", store.load_sources()),
            items: load_or_default("item cache", store.load_items()),
            read: load_or_default("read ids", store.load_read_keys()),
            starred: load_or_default("starred ids", store.load_starred_keys()),
            ..Default::default()
        };

        let seed = state.sources.is_empty() && !ctx.config.sources.defaults.is_empty();
        if seed {
            for default in &ctx.config.sources.defaults {
                match Url::parse(&default.url) {
                    Ok(url) => state.sources.push(Source::new(url, default.name.clone())),
                    Err(e) => tracing::warn!("Skipping default source {}: {}", default.url, e),
                }
            }
            sort_by_display_name(&mut state.sources);
            tracing::info!("Seeded {} default sources", state.sources.len());
            if let Err(e) = ctx.store.save_sources(&state.sources) {
                tracing::warn!("Failed to save sources: {}", e);
            }
        }

        Self {
            ctx,
            state: Mutex::new(state),
            refreshing: AtomicBool::new(false),
        }
    }

    // Presentation-facing views

    /// Cached items that pass the current filter, newest first.
    pub async fn items(&self) -> Vec<Item> {
        self.state.lock().await.visible_items()
    }

    pub async fn sources(&self) -> Vec<Source> {
        self.state.lock().await.sources.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.is_loading
    }

    pub async fn error_message(&self) -> Option<String> {
        self.state.lock().await.error_message.clone()
    }

    pub async fn is_read(&self, item: &Item) -> bool {
        self.state.lock().await.read.contains(item)
    }

    pub async fn is_starred(&self, item: &Item) -> bool {
        self.state.lock().await.starred.contains(item)
    }

    pub async fn filter(&self) -> FeedFilter {
        self.state.lock().await.filter
    }

    pub async fn set_filter(&self, filter: FeedFilter) {
        self.state.lock().await.filter = filter;
    }

    /// Find a cached item by id or by stable key.
    pub async fn find_item(&self, needle: &str) -> Option<Item> {
        let state = self.state.lock().await;
        state
            .items
            .iter()
            .find(|item| item.id.to_string() == needle || item.stable_key() == needle)
            .cloned()
    }

    // Refresh

    /// Fetch every source and merge the results into the cache.
    ///
    /// A call made while another refresh is running returns
    /// [`RefreshOutcome::Coalesced`] without fetching. When every source fails
    /// the cache is left untouched and the error is returned.
    pub async fn load_all_feeds(&self) -> Result<RefreshOutcome> {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            tracing::debug!("Refresh already in flight; coalescing");
            return Ok(RefreshOutcome::Coalesced);
        };

        let sources = {
            let mut state = self.state.lock().await;
            state.error_message = None;
            if state.sources.is_empty() {
                state.is_loading = false;
                return Ok(RefreshOutcome::NoSources);
            }
            state.is_loading = true;
            state.sources.clone()
        };

        tracing::info!("Refreshing {} sources", sources.len());
        let result = self
            .ctx
            .parallel_fetcher
            .fetch_all(&sources, &self.ctx.normalizer)
            .await;

        let mut state = self.state.lock().await;
        state.is_loading = false;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Refresh failed: {}", e);
                state.error_message = Some(format!("Some sources failed to update: {}", e));
                return Err(e);
            }
        };

        state.error_message = report.failure_summary();

        let mut icons_changed = false;
        for batch in &report.batches {
            let Some(icon) = &batch.icon_url else {
                continue;
            };
            if let Some(source) = state.sources.iter_mut().find(|s| s.id == batch.source_id) {
                if source.icon_url.as_ref() != Some(icon) {
                    source.icon_url = Some(icon.clone());
                    icons_changed = true;
                }
            }
        }
        if icons_changed {
            self.persist_sources(&state.sources);
        }

        let fetched = report.item_count();
        let failed = report.failures.len();
        let previous = std::mem::take(&mut state.items);
        state.items = merge(previous, report.into_items());
        self.persist_items(&state.items);

        tracing::info!(
            "Refresh complete: {} items fetched, {} cached, {} sources failed",
            fetched,
            state.items.len(),
            failed
        );

        Ok(RefreshOutcome::Completed { fetched, failed })
    }

    // Source management

    /// Fetch `url` once and, if it decodes as a feed, add it as a source.
    ///
    /// Nothing is added when validation fails. The items fetched while
    /// validating go straight into the cache, then a full refresh runs; its
    /// failure does not undo the add.
    pub async fn validate_and_add_source(&self, url: &str, name: Option<String>) -> Result<Source> {
        let url = Url::parse(url.trim())?;

        if let Some(existing) = self.find_source_by_url(&url).await {
            tracing::info!("Source already exists: {}", url);
            return Ok(existing);
        }

        let feed = self
            .ctx
            .parallel_fetcher
            .validate(&url, &self.ctx.normalizer)
            .await?;

        let mut source = Source::new(url, name);
        source.icon_url = feed.icon_url;

        {
            let mut state = self.state.lock().await;
            state.sources.push(source.clone());
            sort_by_display_name(&mut state.sources);
            self.persist_sources(&state.sources);
            self.merge_fetched(&mut state, source.id, feed.items);
        }
        tracing::info!("Added source {} ({})", source.display_name(), source.id);

        self.refresh_after_change().await;
        Ok(source)
    }

    /// Rename a source and optionally point it at a new URL.
    ///
    /// A changed URL is validated first; on failure nothing changes. The
    /// source keeps its id, and a refresh reconciles its items afterwards.
    pub async fn update_source(
        &self,
        id: Uuid,
        new_name: String,
        new_url: Option<&str>,
    ) -> Result<Source> {
        let current = self
            .source(id)
            .await
            .ok_or_else(|| RunnelError::SourceNotFound(id.to_string()))?;

        let new_url = new_url.map(|u| Url::parse(u.trim())).transpose()?;
        let url_change = new_url.filter(|u| *u != current.url);

        let validated = match &url_change {
            Some(url) => Some(
                self.ctx
                    .parallel_fetcher
                    .validate(url, &self.ctx.normalizer)
                    .await?,
            ),
            None => None,
        };

        let updated = {
            let mut state = self.state.lock().await;
            let source = state
                .sources
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| RunnelError::SourceNotFound(id.to_string()))?;

            source.name = Some(new_name).filter(|n| !n.trim().is_empty());
            let mut fetched = Vec::new();
            if let (Some(url), Some(feed)) = (url_change.clone(), validated) {
                source.url = url;
                source.icon_url = feed.icon_url;
                fetched = feed.items;
            }
            let updated = source.clone();

            sort_by_display_name(&mut state.sources);
            self.persist_sources(&state.sources);
            if !fetched.is_empty() {
                self.merge_fetched(&mut state, id, fetched);
            }
            updated
        };

        if url_change.is_some() {
            tracing::info!("Source {} now points at {}", id, updated.url);
            self.refresh_after_change().await;
        }

        Ok(updated)
    }

    /// Remove a source. Its items stay cached but drop out of the visible set.
    pub async fn delete_source(&self, id: Uuid) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            let index = state
                .sources
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| RunnelError::SourceNotFound(id.to_string()))?;

            let removed = state.sources.remove(index);
            self.persist_sources(&state.sources);

            if state.filter == FeedFilter::Source(id) {
                state.filter = FeedFilter::All;
            }
            tracing::info!("Removed source {}", removed.display_name());
        }

        self.refresh_after_change().await;
        Ok(())
    }

    /// Move the source at `from` to position `to`.
    pub async fn move_source(&self, from: usize, to: usize) -> Result<()> {
        let mut state = self.state.lock().await;
        if from >= state.sources.len() {
            return Err(RunnelError::SourceNotFound(format!("position {}", from)));
        }

        let source = state.sources.remove(from);
        let to = to.min(state.sources.len());
        state.sources.insert(to, source);
        self.persist_sources(&state.sources);
        Ok(())
    }

    // Read / starred state

    /// Returns whether the item is starred afterwards.
    pub async fn toggle_star(&self, item: &Item) -> bool {
        let mut state = self.state.lock().await;
        let starred = state.starred.toggle(item.stable_key());
        self.persist_starred(&state.starred);
        starred
    }

    pub async fn mark_as_read(&self, item: &Item) {
        let mut state = self.state.lock().await;
        if state.read.insert(item.stable_key()) {
            self.persist_read(&state.read);
        }
    }

    /// Mark every cached item read.
    pub async fn mark_all_as_read(&self) {
        let mut state = self.state.lock().await;
        let keys: Vec<String> = state
            .items
            .iter()
            .map(|item| item.stable_key().to_string())
            .collect();
        for key in keys {
            state.read.insert(key);
        }
        self.persist_read(&state.read);
    }

    pub async fn clear_read_status(&self) {
        let mut state = self.state.lock().await;
        state.read.clear();
        self.persist_read(&state.read);
    }

    pub async fn clear_starred_status(&self) {
        let mut state = self.state.lock().await;
        state.starred.clear();
        self.persist_starred(&state.starred);
    }

    /// Drop every cached item that is not starred. Returns how many were kept.
    pub async fn clear_cache(&self) -> usize {
        let mut state = self.state.lock().await;
        let ReaderState { items, starred, .. } = &mut *state;
        let before = items.len();
        items.retain(|item| starred.contains(item));
        let kept = items.len();
        tracing::info!("Cleared cache: kept {} of {} items", kept, before);
        self.persist_items(&state.items);
        kept
    }

    // Internals

    async fn source(&self, id: Uuid) -> Option<Source> {
        let state = self.state.lock().await;
        state.sources.iter().find(|s| s.id == id).cloned()
    }

    async fn find_source_by_url(&self, url: &Url) -> Option<Source> {
        let state = self.state.lock().await;
        state.sources.iter().find(|s| s.url == *url).cloned()
    }

    fn merge_fetched(&self, state: &mut ReaderState, source_id: Uuid, mut fetched: Vec<Item>) {
        for item in &mut fetched {
            item.source_id = Some(source_id);
        }
        let previous = std::mem::take(&mut state.items);
        state.items = merge(previous, fetched);
        self.persist_items(&state.items);
    }

    async fn refresh_after_change(&self) {
        if let Err(e) = self.load_all_feeds().await {
            tracing::warn!("Refresh after source change failed: {}", e);
        }
    }

    fn persist_sources(&self, sources: &[Source]) {
        if let Err(e) = self.ctx.store.save_sources(sources) {
            tracing::warn!("Failed to save sources: {}", e);
        }
    }

    fn persist_items(&self, items: &[Item]) {
        if let Err(e) = self.ctx.store.save_items(items) {
            tracing::warn!("Failed to save item cache: {}", e);
        }
    }

    fn persist_read(&self, keys: &KeySet) {
        if let Err(e) = self.ctx.store.save_read_keys(keys) {
            tracing::warn!("Failed to save read ids: {}", e);
        }
    }

    fn persist_starred(&self, keys: &KeySet) {
        if let Err(e) = self.ctx.store.save_starred_keys(keys) {
            tracing::warn!("Failed to save starred ids: {}", e);
        }
    }
}

fn load_or_default<T: Default>(what: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to load {}; starting empty: {}", what, e);
        T::default()
    })
}
