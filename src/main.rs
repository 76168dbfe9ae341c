use allocation_tracker::application::engine::AllocationEngine;
use allocation_tracker::config::{
    CacheConfig, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DEFAULT_GROUP_TTL, EngineConfig,
    HttpConfig, RetryPolicy,
};
use allocation_tracker::domain::catalog::{AllocationFilters, Credentials};
use allocation_tracker::domain::ports::{CatalogClientBox, GroupCacheBox};
use allocation_tracker::infrastructure::http::HttpCatalogClient;
use allocation_tracker::infrastructure::moka_cache::MokaGroupCache;
use allocation_tracker::infrastructure::retry::RetryingCatalogClient;
use allocation_tracker::interfaces::json::allocation_writer::AllocationWriter;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog account user name
    #[arg(long, env = "ALLOCATION_TRACKER_USERNAME")]
    username: String,

    /// Catalog API key
    #[arg(long, env = "ALLOCATION_TRACKER_APIKEY", hide_env_values = true)]
    apikey: String,

    /// Catalog web service key
    #[arg(long, env = "ALLOCATION_TRACKER_WEBSERVICEKEY", hide_env_values = true)]
    web_service_key: String,

    /// Output file. Defaults to `<username>_allocations.json`.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Return records without expanding terminal and product groups.
    #[arg(long)]
    no_groups: bool,

    /// Maximum number of group lookups in flight.
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

    /// Only allocations of these seller numbers.
    #[arg(long)]
    seller_num: Vec<String>,

    /// Only allocations at these terminals.
    #[arg(long)]
    terminal: Vec<String>,

    /// Only allocations of these product codes.
    #[arg(long)]
    product_code: Vec<String>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::default()
            .with_concurrency(self.concurrency)
            .with_group_ttl(Duration::from_secs(self.group_ttl_secs));
        if self.no_groups {
            config.without_groups()
        } else {
            config
        }
    }

    fn filters(&self) -> AllocationFilters {
        AllocationFilters {
            at_seller_num: self.seller_num.clone(),
            at_terminal: self.terminal.clone(),
            at_product_code: self.product_code.clone(),
            ..Default::default()
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}_allocations.json", self.username)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let http = HttpCatalogClient::new(HttpConfig {
        base_url: cli.base_url.clone(),
        ..Default::default()
    })
    .into_diagnostic()?;
    let client: CatalogClientBox = Box::new(RetryingCatalogClient::new(
        http,
        RetryPolicy {
            max_retries: cli.max_retries,
            ..Default::default()
        },
    ));
    let cache: GroupCacheBox = Box::new(MokaGroupCache::new(&CacheConfig::default()));
    let engine = AllocationEngine::new(client, cache, cli.engine_config());

    let credentials = Credentials::new(&cli.web_service_key, &cli.apikey, &cli.username);

    let started = Instant::now();
    let enrichment = engine
        .allocations(&cli.filters(), &credentials)
        .await
        .into_diagnostic()?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        records = enrichment.records.len(),
        "allocations retrieved"
    );
    if !enrichment.is_complete() {
        warn!(
            failures = enrichment.failures.len(),
            "groups left unresolved"
        );
    }

    let path = cli.output_path();
    let file = File::create(&path).into_diagnostic()?;
    let mut writer = AllocationWriter::new(BufWriter::new(file));
    writer.write_enrichment(&enrichment).into_diagnostic()?;
    info!(path = %path.display(), "allocations written");

    Ok(())
}
