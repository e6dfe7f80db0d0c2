//! Job-Harvest main entry point
//!
//! This is the command-line interface for the Job-Harvest listing crawler.

use clap::Parser;
use job_harvest::config::{load_config_with_hash, validate, Config};
use job_harvest::crawler::CrawlOrchestrator;
use job_harvest::format::describe;
use job_harvest::output::{write_markdown_report, CrawlReport};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Job-Harvest: resilient job-listing retrieval
///
/// Job-Harvest fetches a job search-results page, extracts every listing
/// card and resolves each listing's detail page, rotating proxies and
/// backing off when the source pushes back.
#[derive(Parser, Debug)]
#[command(name = "job-harvest")]
#[command(version)]
#[command(about = "Resilient job-listing retrieval", long_about = None)]
struct Cli {
    /// Search-results URL to crawl
    #[arg(value_name = "SEARCH_URL")]
    search_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of listings (negative for no limit)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    max_num: Option<i64>,

    /// Number of detail pages fetched concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write a markdown report to this path
    #[arg(short, long, value_name = "REPORT")]
    output: Option<PathBuf>,

    /// Check every configured proxy against the search URL before crawling
    #[arg(long)]
    check_proxies: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, Some(hash))
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    // Command-line overrides win over the file
    if let Some(max_num) = cli.max_num {
        config.crawler.max_num = max_num;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&config, &cli.search_url);
        return Ok(());
    }

    handle_crawl(&config, &cli, config_hash.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_harvest=info,warn"),
            1 => EnvFilter::new("job_harvest=debug,info"),
            2 => EnvFilter::new("job_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, search_url: &str) {
    println!("=== Job-Harvest Dry Run ===\n");

    println!("Search URL: {}", search_url);

    println!("\nCrawler Configuration:");
    if config.crawler.max_num < 0 {
        println!("  Max listings: unbounded");
    } else {
        println!("  Max listings: {}", config.crawler.max_num);
    }
    println!("  Detail concurrency: {}", config.crawler.concurrency);

    println!("\nFetcher Configuration:");
    println!("  Max retries: {}", config.fetcher.max_retries);
    println!(
        "  Proxy failure threshold: {}",
        config.fetcher.proxy_failure_threshold
    );
    println!(
        "  Request timeout: {}ms",
        config.fetcher.request_timeout_ms
    );
    println!(
        "  Jitter: {}-{}ms",
        config.fetcher.jitter_min_ms, config.fetcher.jitter_max_ms
    );
    println!(
        "  Backoff: {}-{}ms",
        config.fetcher.backoff_min_ms, config.fetcher.backoff_max_ms
    );
    println!(
        "  Min request interval: {}ms",
        config.fetcher.min_request_interval_ms
    );

    println!("\nSession:");
    println!("  User agents: {}", config.session.user_agents.len());
    println!(
        "  Cookie: {}",
        if config.session.cookie.is_some() {
            "set"
        } else {
            "none"
        }
    );
    println!("  Extra headers: {}", config.session.headers.len());

    println!("\nProxies ({}):", config.proxies.len());
    for proxy in &config.proxies {
        println!("  - {}", proxy);
    }
    if config.proxies.is_empty() {
        println!("  (direct connections only)");
    }

    println!("\n✓ Configuration is valid");
}

/// Checks every enabled proxy once and prints the result
async fn handle_check_proxies(orchestrator: &CrawlOrchestrator, check_url: &str) {
    let fetcher = orchestrator.fetcher();
    let pool = fetcher.proxy_pool();
    if pool.is_empty() {
        println!("No proxies configured");
        return;
    }

    println!("=== Proxy Health ===\n");
    for handle in pool.enabled() {
        let healthy = fetcher.check_proxy(&handle, check_url).await;
        println!(
            "  {} {}",
            if healthy { "✓" } else { "✗" },
            handle.address()
        );
    }
    println!(
        "\n{} of {} proxies enabled\n",
        pool.enabled_count(),
        pool.len()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    cli: &Cli,
    config_hash: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Proxies: {}, max listings: {}, concurrency: {}",
        config.proxies.len(),
        config.crawler.max_num,
        config.crawler.concurrency
    );

    let orchestrator = CrawlOrchestrator::from_config(config)?;

    if cli.check_proxies {
        handle_check_proxies(&orchestrator, &cli.search_url).await;
    }

    // Ctrl-C stops the crawl but keeps what finished
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, returning finished listings");
            on_signal.cancel();
        }
    });

    let result = match orchestrator
        .crawl_with_cancel(&cli.search_url, config.crawler.max_num, cancel)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            if let Some(report) = e.report() {
                eprintln!("{}", report);
            }
            return Err(e.into());
        }
    };

    for (index, record) in result.records.iter().enumerate() {
        println!("--- Listing {} ---", index + 1);
        println!("{}", describe(record));
    }

    let pool = orchestrator.fetcher().proxy_pool();
    if !pool.is_empty() {
        tracing::info!(
            "{} of {} proxies still enabled",
            pool.enabled_count(),
            pool.len()
        );
    }

    if let Some(path) = &cli.output {
        let mut report = CrawlReport::new(&cli.search_url, &result);
        if let Some(hash) = config_hash {
            report = report.with_config_hash(hash);
        }
        write_markdown_report(&report, path)?;
        println!("✓ Report written to: {}", path.display());
    }

    Ok(())
}
