use crate::error::{Error, SourceError};
use crate::hn_api::ItemSource;
use crate::item::{ItemId, RawItem, Story};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bound on loading the ranked id list, retries included.
pub(crate) const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns ranked ids into ranked stories, fetching each window of ids concurrently.
pub(crate) struct FanoutFetcher {
    source: Arc<dyn ItemSource>,
    permits: Arc<tokio::sync::Semaphore>,
    item_timeout: Option<Duration>,
    list_timeout: Duration,
    dropped_items: AtomicU64,
}

impl FanoutFetcher {
    pub(crate) fn new(
        source: Arc<dyn ItemSource>,
        max_concurrent_fetches: usize,
        item_timeout: Option<Duration>,
    ) -> Self {
        Self {
            source,
            permits: Arc::new(tokio::sync::Semaphore::new(max_concurrent_fetches.max(1))),
            item_timeout,
            list_timeout: DEFAULT_LIST_TIMEOUT,
            dropped_items: AtomicU64::new(0),
        }
    }

    pub(crate) fn with_list_timeout(mut self, list_timeout: Duration) -> Self {
        self.list_timeout = list_timeout;
        self
    }

    /// Items dropped so far because their fetch failed or timed out.
    pub(crate) fn dropped_items(&self) -> u64 {
        self.dropped_items.load(Ordering::Relaxed)
    }

    pub(crate) async fn top_stories(&self, count: usize) -> Result<Vec<Story>, Error> {
        // A stalled id list would otherwise hold the cache's refresh lock indefinitely.
        let ids = tokio::time::timeout(self.list_timeout, self.source.top_items())
            .await
            .unwrap_or_else(|_| Err(SourceError::Timeout(self.list_timeout)))
            .map_err(Error::SourceUnavailable)?;

        tracing::debug!(num_ids = ids.len(), "Got top story ids");

        Ok(self.fetch(&ids, count).await)
    }

    /// Returns up to `count` stories in the order their ids appear in `ids`.
    pub(crate) async fn fetch(&self, ids: &[ItemId], count: usize) -> Vec<Story> {
        let mut stories = Vec::with_capacity(count);
        let mut at = 0;

        while stories.len() < count && at < ids.len() {
            let need = count - stories.len();
            let end = (at + need).min(ids.len());
            stories.extend(self.fetch_window(&ids[at..end]).await);
            at = end;
        }

        if stories.len() < count {
            tracing::info!(
                requested = count,
                num_stories = stories.len(),
                num_ids = ids.len(),
                "Ran out of ids before filling the page"
            );
        }

        stories
    }

    async fn fetch_window(&self, ids: &[ItemId]) -> Vec<Story> {
        let mut queries_set: tokio::task::JoinSet<(usize, Result<RawItem, SourceError>)> =
            tokio::task::JoinSet::new();

        for (idx, &id) in ids.iter().enumerate() {
            let source = self.source.clone();
            let permits = self.permits.clone();
            let item_timeout = self.item_timeout;

            queries_set.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();

                let result = match item_timeout {
                    Some(limit) => tokio::time::timeout(limit, source.get_item(id))
                        .await
                        .unwrap_or_else(|_| Err(SourceError::Timeout(limit))),
                    None => source.get_item(id).await,
                };
                (idx, result)
            });
        }

        let mut results = Vec::with_capacity(ids.len());
        let mut dropped = 0;

        while let Some(res) = queries_set.join_next().await {
            match res {
                Ok(result) => results.push(result),
                Err(e) => {
                    dropped += 1;
                    tracing::error!(error =? e, "Item fetch task did not complete");
                }
            }
        }

        results.sort_by_key(|(idx, _)| *idx);

        let mut stories = Vec::with_capacity(results.len());
        for (idx, result) in results {
            match result {
                Ok(item) if crate::item::is_story_link(&item) => stories.push(Story::from(item)),
                Ok(_) => {}
                Err(e) => {
                    dropped += 1;
                    tracing::warn!(id = ids[idx], error = %e, "Dropping item that failed to load");
                }
            }
        }

        if dropped > 0 {
            self.dropped_items.fetch_add(dropped, Ordering::Relaxed);
        }

        tracing::debug!(
            window = ids.len(),
            num_stories = stories.len(),
            num_dropped = dropped,
            "Fetched window"
        );

        stories
    }
}
