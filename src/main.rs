//! Pantry-Scout main entry point
//!
//! This is the command-line interface for the Pantry-Scout site harvester.

use anyhow::{bail, Context};
use clap::Parser;
use pantry_scout::config::{load_config_with_hash, Config, SiteConfig};
use pantry_scout::crawler::Crawler;
use pantry_scout::ingest::export_chunks;
use pantry_scout::output::{
    aggregate_path, flush, generate_markdown_summary, print_statistics, RunSummary, SiteSummary,
};
use pantry_scout::storage::open_ledger;
use pantry_scout::waves::{resume_seeds, run_waves, SeedHarvester, WavePolicy};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Pantry-Scout: a selector-driven site harvester
///
/// Pantry-Scout crawls e-commerce and recipe sites, extracts one record per
/// product or recipe page using per-site CSS selectors, and can re-drive
/// failed seeds through persisted retry waves.
#[derive(Parser, Debug)]
#[command(name = "pantry-scout")]
#[command(version)]
#[command(about = "A selector-driven site harvester", long_about = None)]
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

    /// Only run the named site
    #[arg(long, value_name = "NAME")]
    site: Option<String>,

    /// Ignore persisted retry ledgers and start from the configured seeds
    #[arg(long)]
    fresh: bool,

    /// Drive seeds through retry waves instead of following pagination
    #[arg(long, conflicts_with_all = ["dry_run", "export_chunks"])]
    waves: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["waves", "export_chunks"])]
    dry_run: bool,

    /// Chunk scraped records into JSON Lines for ingestion and exit
    #[arg(long, conflicts_with_all = ["waves", "dry_run"])]
    export_chunks: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let sites = select_sites(&config, cli.site.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&config, &sites);
        return Ok(());
    }
    if cli.export_chunks {
        let report = export_chunks(&config, &sites).context("Chunk export failed")?;
        println!(
            "Exported {} chunks from {} records ({} files skipped) to {}",
            report.chunks, report.documents, report.skipped, config.ingest.output_path
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mode = if cli.waves { "waves" } else { "crawl" };
    let mut summary = RunSummary::new(mode, config_hash);
    for site in sites {
        if cancel.is_cancelled() {
            break;
        }
        let site_summary = if cli.waves {
            handle_waves(&config, site, cli.fresh, &cancel).await?
        } else {
            handle_crawl(&config, site, &cancel).await?
        };
        summary.sites.push(site_summary);
    }
    summary.finish(cancel.is_cancelled());

    if let Some(path) = &config.output.summary_path {
        generate_markdown_summary(&summary, Path::new(path))
            .with_context(|| format!("Failed to write summary to {}", path))?;
        tracing::info!("Summary written to {}", path);
    }

    if cancel.is_cancelled() {
        tracing::warn!("Run interrupted; partial results were saved");
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pantry_scout=info,warn"),
            1 => EnvFilter::new("pantry_scout=debug,info"),
            2 => EnvFilter::new("pantry_scout=trace,debug"),
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

/// Cancels the run on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            cancel.cancel();
        }
    });
}

fn select_sites<'a>(config: &'a Config, name: Option<&str>) -> anyhow::Result<Vec<&'a SiteConfig>> {
    match name {
        Some(name) => match config.site(name) {
            Some(site) => Ok(vec![site]),
            None => bail!("No site named '{}' in configuration", name),
        },
        None => Ok(config.sites.iter().collect()),
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, sites: &[&SiteConfig]) {
    println!("=== Pantry-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Detail workers: {}", config.crawler.workers);
    println!("  Fetch attempts: {}", config.crawler.fetch_retries);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Retry delay: {:.1}-{:.1}s",
        config.crawler.retry_delay.min, config.crawler.retry_delay.max
    );
    println!("  Wave retries: {}", config.retry.max_retries);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_dir);
    println!(
        "  Ledger: {} ({:?})",
        config.output.ledger_dir, config.output.ledger_backend
    );
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\nSites ({}):", sites.len());
    for site in sites {
        println!(
            "  - {} -> {}/ (max pages {}, {} fields)",
            site.name,
            site.category_dir(),
            site.max_pages,
            site.record_fields().count()
        );
        for seed in &site.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        sites.iter().map(|s| s.seeds.len()).sum::<usize>()
    );
}

/// Handles the default mode: every seed is a listing page with pagination
async fn handle_crawl(
    config: &Config,
    site: &SiteConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<SiteSummary> {
    tracing::info!("Crawling {} ({} seeds)", site.name, site.seeds.len());
    let crawler = Crawler::new(site, &config.crawler, &config.output, cancel.clone())
        .with_context(|| format!("Failed to set up crawler for {}", site.name))?;

    for seed in &site.seeds {
        if cancel.is_cancelled() {
            break;
        }
        crawler.crawl_listing(seed).await;
    }

    let records = crawler.take_records();
    let stats = crawler.stats();
    let destination = aggregate_path(&config.output, site);
    flush(&records, &destination)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    print_statistics(&site.name, &stats);

    Ok(SiteSummary {
        name: site.name.clone(),
        stats,
        records: records.len(),
        aggregate_path: Some(destination.display().to_string()),
        waves: None,
    })
}

/// Handles --waves: seeds are retried across cycles with a persisted ledger
async fn handle_waves(
    config: &Config,
    site: &SiteConfig,
    fresh: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<SiteSummary> {
    let mut store = open_ledger(&config.output, &site.name)
        .with_context(|| format!("Failed to open ledger for {}", site.name))?;
    let seeds = resume_seeds(store.as_mut(), &site.seeds, fresh)?;
    tracing::info!("Running waves for {} ({} seeds)", site.name, seeds.len());

    let crawler = Crawler::new(site, &config.crawler, &config.output, cancel.clone())
        .with_context(|| format!("Failed to set up crawler for {}", site.name))?;
    let harvester = SeedHarvester::resume(crawler, store.as_ref())?;
    let policy = WavePolicy::new(config.retry.max_retries);

    let op = {
        let harvester = harvester.clone();
        move |cycle: usize, url: String| {
            let harvester = harvester.clone();
            async move { harvester.harvest(cycle, url).await }
        }
    };
    let report = run_waves(store.as_mut(), &seeds, &policy, cancel, op).await?;

    let (records, stats) = harvester.finish();
    let destination = aggregate_path(&config.output, site);
    flush(&records, &destination)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    print_statistics(&site.name, &stats);
    println!(
        "Waves: {} cycles, {} processed, {} unresolved\n",
        report.cycles_run,
        report.processed.len(),
        report.unresolved.len()
    );

    Ok(SiteSummary {
        name: site.name.clone(),
        stats,
        records: records.len(),
        aggregate_path: Some(destination.display().to_string()),
        waves: Some(report),
    })
}
