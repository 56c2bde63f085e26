use anyhow::Context;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) port: u16,
    pub(crate) num_stories: usize,

    /// How long a published snapshot is served before a request refreshes it.
    pub(crate) cache_ttl: Duration,
    pub(crate) refresh_period: Duration,

    pub(crate) max_concurrent_fetches: usize,
    pub(crate) item_timeout: Option<Duration>,
    pub(crate) list_timeout: Duration,
    pub(crate) api_base_url: String,

    pub(crate) log_to_console: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            num_stories: 30,
            cache_ttl: Duration::from_secs(15),
            refresh_period: Duration::from_secs(5),
            max_concurrent_fetches: 16,
            item_timeout: Some(Duration::from_millis(5000)),
            list_timeout: crate::fetcher::DEFAULT_LIST_TIMEOUT,
            api_base_url: crate::hn_api::DEFAULT_BASE_URL.to_string(),
            log_to_console: false,
        }
    }
}

impl Config {
    /// Reads the process environment, including a `.env` file if there is one.
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        // A missing .env file is fine, every setting has a default.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(port) = parse::<u16>(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(num_stories) = parse::<usize>(&lookup, "NUM_STORIES")? {
            config.num_stories = num_stories;
        }
        if let Some(secs) = parse::<u64>(&lookup, "CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "REFRESH_PERIOD_SECS")? {
            config.refresh_period = Duration::from_secs(secs);
        }
        if let Some(max) = parse::<usize>(&lookup, "MAX_CONCURRENT_FETCHES")? {
            config.max_concurrent_fetches = max;
        }
        if let Some(ms) = parse::<u64>(&lookup, "ITEM_TIMEOUT_MS")? {
            // 0 waits on items forever.
            config.item_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(ms) = parse::<u64>(&lookup, "TOP_ITEMS_TIMEOUT_MS")? {
            config.list_timeout = Duration::from_millis(ms);
        }
        if let Some(url) = lookup("HN_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(log_to_console) = parse::<bool>(&lookup, "LOG_TO_CONSOLE")? {
            config.log_to_console = log_to_console;
        }

        Ok(config)
    }

    pub(crate) fn with_args(mut self, args: &crate::Args) -> Self {
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(num_stories) = args.num_stories {
            self.num_stories = num_stories;
        }
        if let Some(secs) = args.cache_ttl_secs {
            self.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = args.refresh_period_secs {
            self.refresh_period = Duration::from_secs(secs);
        }
        self.log_to_console |= args.log_to_console;
        self
    }

    pub(crate) fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(!self.cache_ttl.is_zero(), "cache ttl must be greater than zero");
        anyhow::ensure!(
            self.refresh_period < self.cache_ttl,
            "refresh period ({:?}) must be shorter than the cache ttl ({:?})",
            self.refresh_period,
            self.cache_ttl
        );
        anyhow::ensure!(
            !self.refresh_period.is_zero(),
            "refresh period must be greater than zero"
        );
        anyhow::ensure!(
            self.max_concurrent_fetches > 0,
            "MAX_CONCURRENT_FETCHES must be at least 1"
        );
        anyhow::ensure!(
            self.max_concurrent_fetches <= tokio::sync::Semaphore::MAX_PERMITS,
            "MAX_CONCURRENT_FETCHES must be at most {}",
            tokio::sync::Semaphore::MAX_PERMITS
        );
        anyhow::ensure!(
            !self.list_timeout.is_zero(),
            "TOP_ITEMS_TIMEOUT_MS must be greater than zero"
        );
        Ok(self)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value: {:?}", key, value))
        })
        .transpose()
}
