//! In-memory item source used by the fetcher, cache, refresher and server tests.

use crate::error::SourceError;
use crate::hn_api::ItemSource;
use crate::item::{ItemId, RawItem};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct FakeSource {
    ids: Vec<ItemId>,
    items: HashMap<ItemId, RawItem>,
    failing: HashSet<ItemId>,
    hanging: HashSet<ItemId>,
    latency: Duration,
    max_random_delay_ms: Option<u64>,
    top_items_fails: AtomicBool,
    top_items_delay: Mutex<Duration>,
    top_items_calls: AtomicUsize,
    pub(crate) item_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

pub(crate) fn story(id: ItemId) -> RawItem {
    RawItem {
        id,
        kind: "story".to_string(),
        title: format!("Story {}", id),
        url: Some(format!("https://www.site{}.com/post/{}", id, id)),
        score: id * 10,
        by: Some("pg".to_string()),
        descendants: Some(id),
    }
}

impl FakeSource {
    /// `n` ranked stories with ids `1..=n`.
    pub(crate) fn stories(n: ItemId) -> Self {
        let mut source = Self::default();
        for id in 1..=n {
            source = source.with_item(story(id));
        }
        source
    }

    /// Appends `item` to the ranking.
    pub(crate) fn with_item(mut self, item: RawItem) -> Self {
        self.ids.push(item.id);
        self.items.insert(item.id, item);
        self
    }

    pub(crate) fn failing(mut self, id: ItemId) -> Self {
        self.failing.insert(id);
        self
    }

    pub(crate) fn hanging(mut self, id: ItemId) -> Self {
        self.hanging.insert(id);
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn with_random_delays(mut self, max_ms: u64) -> Self {
        self.max_random_delay_ms = Some(max_ms);
        self
    }

    pub(crate) fn set_top_items_failing(&self, fails: bool) {
        self.top_items_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn set_top_items_delay(&self, delay: Duration) {
        *self.top_items_delay.lock().unwrap() = delay;
    }

    pub(crate) fn top_items_calls(&self) -> usize {
        self.top_items_calls.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ItemSource for FakeSource {
    async fn top_items(&self) -> Result<Vec<ItemId>, SourceError> {
        self.top_items_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.top_items_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.top_items_fails.load(Ordering::SeqCst) {
            return Err(SourceError::Other("top stories unavailable".to_string()));
        }
        Ok(self.ids.clone())
    }

    async fn get_item(&self, id: ItemId) -> Result<RawItem, SourceError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = match self.max_random_delay_ms {
            Some(max_ms) => {
                use rand::Rng;
                Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
            }
            None => self.latency,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.hanging.contains(&id) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&id) {
            return Err(SourceError::Other(format!("item {} failed", id)));
        }
        self.items.get(&id).cloned().ok_or(SourceError::Missing(id))
    }
}
