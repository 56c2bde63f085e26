use crate::item::ItemId;

/// Failure of a single call against the item API.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("item {0} does not exist")]
    Missing(ItemId),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("failed to load top stories: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error("failed to refresh story cache: {0}")]
    RefreshFailed(#[source] Box<Error>),

    #[error("failed to render page")]
    Render(#[from] std::fmt::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_failed_message_includes_cause() {
        let err = Error::RefreshFailed(Box::new(Error::SourceUnavailable(SourceError::Other(
            "connection reset".to_string(),
        ))));

        assert_eq!(
            err.to_string(),
            "failed to refresh story cache: failed to load top stories: connection reset"
        );
    }

    #[test]
    fn test_source_error_display() {
        assert_eq!(SourceError::Missing(42).to_string(), "item 42 does not exist");
        assert_eq!(
            SourceError::Timeout(std::time::Duration::from_millis(250)).to_string(),
            "timed out after 250ms"
        );
    }
}
