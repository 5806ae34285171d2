//! Linkscout main entry point
//!
//! This is the command-line interface for the linkscout incremental crawler.

use clap::Parser;
use std::path::PathBuf;
use linkscout::config::load_config_with_hash;
use linkscout::crawler::crawl;
use linkscout::state::RunState;
use tracing_subscriber::EnvFilter;

/// Linkscout: an incremental single-site link scout
///
/// Linkscout crawls one website per run, skips pages whose content has not
/// changed since the previous run, and keeps a ranked set of high-value
/// links in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "linkscout")]
#[command(version = "0.1.0")]
#[command(about = "An incremental single-site link scout", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "top_links")]
    dry_run: bool,

    /// Show the N best-scored links from the database and exit
    #[arg(long, value_name = "N", conflicts_with = "dry_run")]
    top_links: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(count) = cli.top_links {
        handle_top_links(&config, count)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkscout=info,warn"),
            1 => EnvFilter::new("linkscout=debug,info"),
            2 => EnvFilter::new("linkscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &linkscout::Config) {
    println!("=== Linkscout Dry Run ===\n");

    println!("Site:");
    println!("  URL: {}", config.site.url);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout_ms);
    println!("  Inspect timeout: {}ms", config.crawler.inspect_timeout_ms);

    println!("\nTraversal Filter:");
    println!("  Max depth: {}", config.filter.max_depth);
    println!("  Max query params: {}", config.filter.max_query_params);
    println!("  Max path segments: {}", config.filter.max_path_segments);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    if config.keywords.is_empty() {
        println!("\nKeyword weights: defaults");
    } else {
        println!("\nKeyword weight overrides ({}):", config.keywords.len());
        let mut overrides: Vec<_> = config.keywords.iter().collect();
        overrides.sort_by(|a, b| a.0.cmp(b.0));
        for (keyword, weight) in overrides {
            println!("  - {} = {}", keyword, weight);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {}", config.site.url);
}

/// Handles the --top-links mode: prints the best-scored links and exits
fn handle_top_links(
    config: &linkscout::Config,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    use linkscout::score::decode_keywords;
    use linkscout::storage::{open_store, Store};
    use linkscout::url::canonicalize_site_url;

    println!("Database: {}\n", config.storage.database_path);

    // Sites are stored under the canonical URL form
    let site_url = canonicalize_site_url(&config.site.url)?;
    let store = open_store(&config.storage.database_path)?;
    let site = match store.get_site_by_url(site_url.as_str())? {
        Some(site) => site,
        None => {
            println!("No crawl data for {} yet", site_url);
            return Ok(());
        }
    };

    let links = store.list_links_for_site(site.id)?;
    if links.is_empty() {
        println!("No scored links recorded for {}", site.url);
        return Ok(());
    }

    println!("Top {} links for {} (run {}):", count.min(links.len()), site.url, site.run_id);
    for record in links.iter().take(count) {
        println!(
            "  {:.3}  {}  [{}]",
            record.link.score,
            record.link.url,
            decode_keywords(&record.link.keywords).join(", ")
        );
        println!("         found on {}", record.page_url);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: linkscout::Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting crawl of {}", config.site.url);

    let outcome = match crawl(config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    match outcome.state {
        RunState::Completed => {
            tracing::info!(
                "Run {} completed: {} pages visited ({} changed, {} unchanged), {} links recorded",
                outcome.run_id,
                outcome.pages_visited,
                outcome.pages_changed,
                outcome.pages_unchanged,
                outcome.links_recorded
            );
            if outcome.urls_failed > 0 || outcome.urls_skipped > 0 {
                tracing::warn!(
                    "{} URLs failed, {} skipped by robots.txt",
                    outcome.urls_failed,
                    outcome.urls_skipped
                );
            }
            if let Some(sweep) = outcome.sweep {
                tracing::info!(
                    "Swept {} stale pages and {} stale links",
                    sweep.pages_deleted,
                    sweep.links_deleted
                );
            }
            Ok(())
        }
        _ => {
            let reason = outcome
                .error
                .unwrap_or_else(|| "unknown reason".to_string());
            tracing::error!("Run {} aborted: {}", outcome.run_id, reason);
            Err(linkscout::CrawlError::Aborted(reason).into())
        }
    }
}
