use allocation_tracker::application::engine::AllocationEngine;
use allocation_tracker::config::{
    CacheConfig, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DEFAULT_GROUP_TTL, EngineConfig,
    HttpConfig, RetryPolicy,
};
use allocation_tracker::domain::ports::{CatalogClientBox, GroupCacheBox};
use allocation_tracker::infrastructure::http::HttpCatalogClient;
use allocation_tracker::infrastructure::moka_cache::MokaGroupCache;
use allocation_tracker::infrastructure::retry::RetryingCatalogClient;
use allocation_tracker::interfaces::http_api;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serves `POST /allocations` with credentials taken from each request body.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "ALLOCATION_API_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Return records without expanding terminal and product groups.
    #[arg(long)]
    no_groups: bool,

    /// Maximum number of group lookups in flight per request.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Lifetime of cached group memberships, in seconds.
    #[arg(long, default_value_t = DEFAULT_GROUP_TTL.as_secs())]
    group_ttl_secs: u64,

    /// Retries for transient catalog failures.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let http = HttpCatalogClient::new(HttpConfig {
        base_url: args.base_url.clone(),
        ..Default::default()
    })
    .into_diagnostic()?;
    let client: CatalogClientBox = Box::new(RetryingCatalogClient::new(
        http,
        RetryPolicy {
            max_retries: args.max_retries,
            ..Default::default()
        },
    ));
    let cache: GroupCacheBox = Box::new(MokaGroupCache::new(&CacheConfig::default()));
    let mut config = EngineConfig::default()
        .with_concurrency(args.concurrency)
        .with_group_ttl(Duration::from_secs(args.group_ttl_secs));
    if args.no_groups {
        config = config.without_groups();
    }
    let engine = Arc::new(AllocationEngine::new(client, cache, config));

    let listener = TcpListener::bind(args.listen).await.into_diagnostic()?;
    info!(addr = %listener.local_addr().into_diagnostic()?, "allocation API listening");
    axum::serve(listener, http_api::router(engine))
        .await
        .into_diagnostic()?;

    Ok(())
}
