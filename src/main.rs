use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use modhist::config::{self, FetchConfig};
use modhist::index::{IndexClient, Orchestrator};
use modhist::report::{self, PrintFields, SortKey};

#[derive(Parser)]
#[command(name = "modhist")]
#[command(version, about = "Search the publication history of Go modules")]
struct Cli {
    /// Regular expression matched against module paths
    pattern: String,

    /// Fetch every window from the index instead of using the local cache
    #[arg(long)]
    no_cache: bool,

    /// Directory holding cached windows
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Overall timeout in seconds; 0 disables it
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    timeout: u64,

    /// Order of versions within a module
    #[arg(long, value_enum, default_value_t = SortKey::Version)]
    sort: SortKey,

    /// Print the version of each entry
    #[arg(long)]
    show_version: bool,

    /// Print the publication time of each entry
    #[arg(long)]
    show_timestamp: bool,

    /// Report recoverable errors such as cache misses and retried requests
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Module index endpoint
    #[arg(long, value_name = "URL", default_value = config::DEFAULT_INDEX_URL)]
    index_url: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = modhist::logging::init(cli.verbose, cli.log_json);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pattern = Regex::new(&cli.pattern)
        .with_context(|| format!("Invalid module path pattern {:?}", cli.pattern))?;

    let config = FetchConfig {
        base_url: cli.index_url,
        cache: !cli.no_cache,
        cache_dir: cli.cache_dir.unwrap_or_else(config::cache_dir),
        verbose: cli.verbose,
        timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
        ..FetchConfig::default()
    };
    let source = Arc::new(IndexClient::new(&config.base_url)?);
    let orchestrator = Arc::new(Orchestrator::new(config, source));

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling fetch");
            interrupt.cancel();
        }
    });

    let (mut rx, fetch) = orchestrator.spawn(Utc::now(), token.clone());
    let collected = report::collect_matching(&token, &mut rx, &pattern).await;
    drop(rx);

    fetch
        .await
        .context("Fetch task panicked")?
        .context("Failed to fetch the module index")?;
    let mut records = collected?;

    report::sort_records(&mut records, cli.sort);
    let fields = PrintFields {
        version: cli.show_version,
        timestamp: cli.show_timestamp,
    };
    report::write_records(&mut std::io::stdout().lock(), &records, fields)?;

    Ok(())
}
