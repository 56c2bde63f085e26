//! Keeps the story cache warm so page requests never wait on the HN API.

use crate::cache::StoryCache;
use std::sync::Arc;
use std::time::Duration;

/// Spawn a background task that republishes the top `count` stories every `period`.
///
/// The first refresh runs immediately. A failed cycle leaves the previous snapshot in place.
pub(crate) fn spawn_refresher(
    cache: Arc<StoryCache>,
    count: usize,
    period: Duration,
    cancel_token: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tokio::select! {
                        res = cache.refresh(count) => {
                            if let Err(e) = res {
                                tracing::error!(error = %e, "Background refresh failed, keeping previous stories");
                            }
                        }
                        _ = cancel_token.cancelled() => break,
                    }
                }
                _ = cancel_token.cancelled() => break,
            }
        }

        tracing::info!("Background refresher stopped");
    })
}
