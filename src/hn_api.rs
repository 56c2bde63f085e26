use crate::error::SourceError;
use crate::item::{ItemId, RawItem};

pub(crate) const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Where ranked ids and item details come from.
#[async_trait::async_trait]
pub(crate) trait ItemSource: Send + Sync {
    /// Current ranked ids, most significant first.
    async fn top_items(&self) -> Result<Vec<ItemId>, SourceError>;

    async fn get_item(&self, id: ItemId) -> Result<RawItem, SourceError>;
}

pub(crate) struct HnClient {
    client: reqwest::Client,
    base_url: String,
}

impl HnClient {
    pub(crate) fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path);
        let url = &url;
        let client = &self.client;

        backoff::future::retry_notify(
            crate::backoff::backoff_default(),
            || async move {
                let response = client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(crate::backoff::classify)?;
                let response = response
                    .error_for_status()
                    .map_err(crate::backoff::classify)?;
                response.json::<T>().await.map_err(crate::backoff::classify)
            },
            |e: SourceError, wait: std::time::Duration| {
                tracing::warn!(url = url, error = %e, retry_in =? wait, "Retrying HN API request")
            },
        )
        .await
    }
}

#[async_trait::async_trait]
impl ItemSource for HnClient {
    async fn top_items(&self) -> Result<Vec<ItemId>, SourceError> {
        self.get_json::<Vec<ItemId>>("topstories.json").await
    }

    async fn get_item(&self, id: ItemId) -> Result<RawItem, SourceError> {
        // Deleted or not yet propagated items come back as a literal `null`.
        self.get_json::<Option<RawItem>>(&format!("item/{}.json", id))
            .await?
            .ok_or(SourceError::Missing(id))
    }
}
