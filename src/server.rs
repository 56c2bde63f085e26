//! HTTP front end: the story page and a health endpoint.

use crate::cache::StoryCache;
use crate::error::Error;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) cache: Arc<StoryCache>,
    pub(crate) num_stories: usize,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Health {
    pub(crate) stories: usize,
    pub(crate) snapshot_age_ms: Option<u64>,
    pub(crate) dropped_items: u64,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        match self {
            Error::Render(_) => (status, "Failed to process the template").into_response(),
            e => (status, e.to_string()).into_response(),
        }
    }
}

pub(crate) fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, Error> {
    let start = std::time::Instant::now();

    let snapshot = state.cache.get(state.num_stories).await.inspect_err(|e| {
        tracing::error!(error = %e, "Failed to get stories");
    })?;

    let page = crate::render::render_page(&snapshot.stories, start.elapsed()).inspect_err(|e| {
        tracing::error!(error = %e, "Failed to render stories");
    })?;

    Ok(Html(page))
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let snapshot = state.cache.current().await;

    Json(Health {
        stories: snapshot.as_ref().map_or(0, |s| s.stories.len()),
        snapshot_age_ms: snapshot.map(|s| s.age().as_millis() as u64),
        dropped_items: state.cache.fetcher().dropped_items(),
    })
}

/// Serves until `cancel_token` is cancelled, then drains in-flight requests.
pub(crate) async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cancel_token: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await?;
    Ok(())
}
