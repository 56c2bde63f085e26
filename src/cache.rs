use crate::error::Error;
use crate::fetcher::FanoutFetcher;
use crate::item::Story;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// An immutable page of stories. Replaced as a whole, never edited.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub(crate) stories: Vec<Story>,
    count: usize,
    fetched_at: Instant,
    expires_at: Instant,
}

impl Snapshot {
    fn is_fresh_for(&self, count: usize, now: Instant) -> bool {
        self.count == count && now < self.expires_at
    }

    pub(crate) fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

pub(crate) struct StoryCache {
    fetcher: Arc<FanoutFetcher>,
    ttl: Duration,
    current: tokio::sync::RwLock<Option<Arc<Snapshot>>>,
    // Held for the whole fetch so concurrent stale readers share one refresh.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl StoryCache {
    pub(crate) fn new(fetcher: Arc<FanoutFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            current: tokio::sync::RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub(crate) fn fetcher(&self) -> &FanoutFetcher {
        &self.fetcher
    }

    /// The last published snapshot, fresh or not.
    pub(crate) async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    async fn fresh(&self, count: usize) -> Option<Arc<Snapshot>> {
        self.current()
            .await
            .filter(|snapshot| snapshot.is_fresh_for(count, Instant::now()))
    }

    /// Serves the published snapshot while it is fresh, otherwise refreshes it first.
    ///
    /// A failed refresh leaves the cache untouched so the next call tries again.
    pub(crate) async fn get(&self, count: usize) -> Result<Arc<Snapshot>, Error> {
        if let Some(snapshot) = self.fresh(count).await {
            return Ok(snapshot);
        }

        let _refreshing = self.refresh_lock.lock().await;

        // Whoever held the lock before us may already have refreshed.
        if let Some(snapshot) = self.fresh(count).await {
            return Ok(snapshot);
        }

        tracing::info!(count = count, "Story cache is stale, refreshing");
        self.fetch_and_publish(count)
            .await
            .map_err(|e| Error::RefreshFailed(Box::new(e)))
    }

    /// Fetches and publishes a new snapshot whatever the age of the current one.
    pub(crate) async fn refresh(&self, count: usize) -> Result<Arc<Snapshot>, Error> {
        let _refreshing = self.refresh_lock.lock().await;
        self.fetch_and_publish(count).await
    }

    async fn fetch_and_publish(&self, count: usize) -> Result<Arc<Snapshot>, Error> {
        let started = Instant::now();
        let stories = self.fetcher.top_stories(count).await?;

        let now = Instant::now();
        let snapshot = Arc::new(Snapshot {
            stories,
            count,
            fetched_at: now,
            expires_at: now + self.ttl,
        });

        *self.current.write().await = Some(snapshot.clone());

        tracing::info!(
            num_stories = snapshot.stories.len(),
            took_ms = started.elapsed().as_millis() as u64,
            dropped_items_total = self.fetcher.dropped_items(),
            "Published story snapshot"
        );

        Ok(snapshot)
    }
}
