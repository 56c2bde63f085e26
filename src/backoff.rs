const MAX_INTERVAL_BETWEEN_TRIES: std::time::Duration = std::time::Duration::from_secs(2);

pub(crate) fn backoff_default() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_interval(MAX_INTERVAL_BETWEEN_TRIES)
        .with_max_elapsed_time(Some(std::time::Duration::from_secs(10)))
        .build()
}

/// Server errors and transport failures are worth another try. Client errors and
/// bodies that do not decode are not.
pub(crate) fn classify(err: reqwest::Error) -> backoff::Error<crate::error::SourceError> {
    let permanent = err.is_decode() || err.status().is_some_and(|s| s.is_client_error());
    if permanent {
        backoff::Error::permanent(err.into())
    } else {
        backoff::Error::transient(err.into())
    }
}
