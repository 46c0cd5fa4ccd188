use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use url::Url;
use uuid::Uuid;

use crate::app::{Result, RunnelError};
use crate::domain::{Item, Source};
use crate::fetcher::Fetcher;
use crate::normalizer::{NormalizedFeed, Normalizer};

pub const DEFAULT_WORKERS: usize = 10;

/// Items fetched from one source.
#[derive(Debug)]
pub struct SourceBatch {
    pub source_id: Uuid,
    pub icon_url: Option<Url>,
    pub items: Vec<Item>,
}

#[derive(Debug)]
pub struct SourceFailure {
    pub source_id: Uuid,
    pub url: Url,
    pub error: RunnelError,
}

/// Outcome of a batch refresh. Batches follow the order of the source list.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub batches: Vec<SourceBatch>,
    pub failures: Vec<SourceFailure>,
}

impl FetchReport {
    pub fn item_count(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// User-facing description of failed sources, if any.
    pub fn failure_summary(&self) -> Option<String> {
        let first = self.failures.first()?;
        Some(format!(
            "Some sources failed to update ({} of {}): {}: {}",
            self.failures.len(),
            self.failures.len() + self.batches.len(),
            first.url,
            first.error
        ))
    }

    pub fn into_items(self) -> Vec<Item> {
        self.batches.into_iter().flat_map(|b| b.items).collect()
    }
}

pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Fetch and normalize every source concurrently and wait for all of them.
    ///
    /// Individual failures land in [`FetchReport::failures`]. The call itself
    /// fails only when there was at least one source and none succeeded.
    pub async fn fetch_all(&self, sources: &[Source], normalizer: &Normalizer) -> Result<FetchReport> {
        if sources.is_empty() {
            return Ok(FetchReport::default());
        }

        let mut tasks = FuturesUnordered::new();

        for (index, source) in sources.iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let normalizer = normalizer.clone();
            let url = source.url.clone();
            let source_id = source.id;

            let handle = tokio::spawn(async move {
                match semaphore.acquire().await {
                    Ok(_permit) => {
                        fetch_source(fetcher.as_ref(), &url, Some(source_id), &normalizer).await
                    }
                    Err(_) => Err(RunnelError::Transport("fetch pool closed".into())),
                }
            });

            tasks.push(async move { (index, handle.await) });
        }

        // Completion order is arbitrary; slot results back by source position.
        let mut completed = Vec::with_capacity(sources.len());
        while let Some((index, joined)) = tasks.next().await {
            let result = joined.unwrap_or_else(|e| {
                tracing::error!("Task join error: {}", e);
                Err(RunnelError::Transport(format!("fetch task aborted: {}", e)))
            });
            completed.push((index, result));
        }
        completed.sort_by_key(|(index, _)| *index);

        let mut report = FetchReport::default();
        for (index, result) in completed {
            let source = &sources[index];
            match result {
                Ok(feed) => {
                    tracing::debug!("Fetched {} items from {}", feed.items.len(), source.url);
                    report.batches.push(SourceBatch {
                        source_id: source.id,
                        icon_url: feed.icon_url,
                        items: feed.items,
                    });
                }
                Err(error) => {
                    tracing::warn!("Failed to update {}: {}", source.url, error);
                    report.failures.push(SourceFailure {
                        source_id: source.id,
                        url: source.url.clone(),
                        error,
                    });
                }
            }
        }

        if report.batches.is_empty() {
            let first = report
                .failures
                .first()
                .map(|f| f.error.to_string())
                .unwrap_or_default();
            return Err(RunnelError::AllSourcesFailed {
                failed: report.failures.len(),
                first,
            });
        }

        Ok(report)
    }

    /// Run the same fetch + normalize used for refreshes against one URL.
    ///
    /// Any successful decode counts, including a feed with no usable entries.
    pub async fn validate(&self, url: &Url, normalizer: &Normalizer) -> Result<NormalizedFeed> {
        fetch_source(self.fetcher.as_ref(), url, None, normalizer)
            .await
            .map_err(|e| RunnelError::validation(url.as_str(), e))
    }
}

async fn fetch_source(
    fetcher: &(dyn Fetcher + Send + Sync),
    url: &Url,
    source_id: Option<Uuid>,
    normalizer: &Normalizer,
) -> Result<NormalizedFeed> {
    let body = fetcher.fetch(url.as_str()).await?;
    normalizer.normalize_bytes(source_id, &body)
}
