use tracing_subscriber::util::SubscriberInitExt;

mod backoff;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod fetcher;
pub(crate) mod hn_api;
pub(crate) mod item;
pub(crate) mod refresher;
pub(crate) mod render;
pub(crate) mod server;
#[cfg(test)]
mod test_helpers;

pub(crate) static CLIENT: std::sync::LazyLock<reqwest::Client> =
    std::sync::LazyLock::new(reqwest::Client::new);

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    #[arg(help = "The port to start the web server on [env: PORT, default: 3000]")]
    port: Option<u16>,

    #[arg(short, long)]
    #[arg(help = "The number of top stories to display [env: NUM_STORIES, default: 30]")]
    num_stories: Option<usize>,

    #[arg(long)]
    #[arg(help = "Seconds a page of stories is served before it is refetched")]
    cache_ttl_secs: Option<u64>,

    #[arg(long)]
    #[arg(help = "Seconds between background refreshes, must be below the cache ttl")]
    refresh_period_secs: Option<u64>,

    #[arg(short, long, default_value = "false")]
    #[arg(help = "Log to console")]
    log_to_console: bool,
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    let source = std::sync::Arc::new(hn_api::HnClient::new(
        CLIENT.clone(),
        &config.api_base_url,
    ));
    let fetcher = std::sync::Arc::new(
        fetcher::FanoutFetcher::new(source, config.max_concurrent_fetches, config.item_timeout)
            .with_list_timeout(config.list_timeout),
    );
    let cache = std::sync::Arc::new(cache::StoryCache::new(fetcher, config.cache_ttl));

    let cancel_token = tokio_util::sync::CancellationToken::new();
    let refresher = refresher::spawn_refresher(
        cache.clone(),
        config.num_stories,
        config.refresh_period,
        cancel_token.clone(),
    );

    let shutdown = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => tracing::error!(error =? e, "Unable to listen for shutdown signal"),
        }
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(addr =? listener.local_addr()?, "Listening");

    let state = server::AppState {
        cache,
        num_stories: config.num_stories,
    };
    let served = server::serve(listener, state, cancel_token.clone()).await;

    cancel_token.cancel();
    refresher.await?;

    served
}

#[tokio::main]
async fn main() {
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;

    use clap::Parser;
    let args = Args::parse();

    let config = match config::Config::from_env().and_then(|c| c.with_args(&args).validate()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(2);
        }
    };

    let file_appender = tracing_appender::rolling::daily("./log", "quiet_hn.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer();
    let file_layer = file_layer
        .with_writer(non_blocking)
        .json()
        .with_filter(tracing::level_filters::LevelFilter::INFO)
        .boxed();

    let pretty_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stdout)
        .with_filter(tracing::level_filters::LevelFilter::INFO)
        .boxed();

    let registry = tracing_subscriber::registry().with(file_layer);

    if config.log_to_console {
        registry.with(pretty_layer).init();
    } else {
        registry.init();
    };

    tracing::info!(config =? config, args =? args, "Starting Quiet HN");

    match run(config).await {
        Ok(()) => tracing::info!("Quiet HN stopped"),
        Err(e) => {
            tracing::error!(error =? e, "Quiet HN exited with an error");
            drop(guard);
            std::process::exit(1);
        }
    }
}
