//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest batch fetcher.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use page_harvest::config::{load_config_with_hash, Config};
use page_harvest::item::{dedup_ids, ItemId};
use page_harvest::output::{collect_statistics, print_statistics, write_json_report, BatchReport};
use page_harvest::renderer::build_renderer;
use page_harvest::storage::{open_artifact_store, open_existing_artifact_store};
use page_harvest::{
    load_site_profile, BatchOptions, ItemFetcher, Orchestrator, SiteProfile, UrlTemplate,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: a polite batch page fetcher
///
/// Page-Harvest renders one page per item ID, checks it against a site
/// profile, and stores recognised pages. Items already stored are skipped,
/// failed fetches are retried with backoff, and Ctrl-C stops the batch
/// cleanly.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite batch page fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Item IDs to fetch
    #[arg(value_name = "IDS")]
    ids: Vec<String>,

    /// Read additional item IDs from a file (one per line, `#` starts a comment)
    #[arg(long, value_name = "PATH")]
    ids_file: Option<PathBuf>,

    /// Fetch items even if an artifact is already stored
    #[arg(long)]
    force: bool,

    /// Write a JSON report of the run to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config, profile and IDs and show what would be fetched
    #[arg(long, conflicts_with_all = ["list_saved", "show"])]
    dry_run: bool,

    /// List the IDs of stored artifacts and exit
    #[arg(long, conflicts_with_all = ["dry_run", "show"])]
    list_saved: bool,

    /// Print the stored artifact for an ID and exit
    #[arg(long, value_name = "ID", conflicts_with_all = ["dry_run", "list_saved"])]
    show: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.list_saved {
        return handle_list_saved(&config);
    }
    if let Some(id) = &cli.show {
        return handle_show(&config, id);
    }

    let raw_ids = collect_ids(&cli.ids, cli.ids_file.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&config, &raw_ids, cli.force)
    } else {
        handle_run(config, config_hash, raw_ids, cli.force, cli.report).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
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

/// Gathers IDs from the command line and the optional IDs file
fn collect_ids(cli_ids: &[String], ids_file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut ids = cli_ids.to_vec();

    if let Some(path) = ids_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read IDs file {}", path.display()))?;
        ids.extend(parse_ids_file(&content));
    }

    Ok(ids)
}

/// Splits an IDs file into entries, skipping blank lines and `#` comments
fn parse_ids_file(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

fn load_profile(config: &Config) -> anyhow::Result<Option<SiteProfile>> {
    let path = Path::new(&config.profile.path);
    load_site_profile(path)
        .with_context(|| format!("Failed to load site profile from {}", path.display()))
}

/// Handles the --dry-run mode: validates inputs and shows what would be fetched
fn handle_dry_run(config: &Config, raw_ids: &[String], force: bool) -> anyhow::Result<()> {
    println!("=== Page-Harvest Dry Run ===\n");

    let template = UrlTemplate::new(config.fetch.url_template.as_str())?;
    let ids = dedup_ids(raw_ids.iter().cloned())?;
    let profile = load_profile(config)?;
    let store = open_existing_artifact_store(&config.output)?;

    println!("Fetch Configuration:");
    println!("  URL template: {}", template);
    println!("  Concurrency: {}", config.fetch.concurrency);
    println!("  Inter-request delay: {}ms", config.fetch.inter_request_delay);
    println!(
        "  Retries: {} (backoff {}ms..{}ms)",
        config.fetch.max_retries, config.fetch.backoff_base, config.fetch.backoff_cap
    );
    println!("  Render timeout: {}ms", config.fetch.render_timeout);

    println!("\nRenderer: {:?}", config.renderer.kind);
    println!("Output: {:?}", config.output.backend);
    if store.is_none() {
        println!("  (store not created yet, nothing saved)");
    }

    match &profile {
        Some(profile) => {
            println!("\nSite Profile ({}):", config.profile.path);
            println!("  Domain: {}", profile.domain());
            println!("  Present indicators: {}", profile.present_indicators().len());
            println!("  Removal patterns: {}", profile.removed_patterns().len());
        }
        None => println!("\nSite Profile: none (any non-empty page counts as success)"),
    }

    println!("\nItems ({}):", ids.len());
    let mut to_fetch = 0;
    for id in &ids {
        let saved = match &store {
            Some(store) if !force => store.exists(id)?,
            _ => false,
        };
        if !saved {
            to_fetch += 1;
        }
        println!(
            "  - {} {}{}",
            id,
            template.resolve(id)?,
            if saved { " (already saved)" } else { "" }
        );
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} of {} items", to_fetch, ids.len());

    Ok(())
}

/// Handles the --list-saved mode: prints stored artifact IDs
fn handle_list_saved(config: &Config) -> anyhow::Result<()> {
    let Some(store) = open_existing_artifact_store(&config.output)? else {
        return Ok(());
    };

    for id in store.list_keys()? {
        println!("{}", id);
    }

    Ok(())
}

/// Handles the --show mode: prints one stored artifact
fn handle_show(config: &Config, raw_id: &str) -> anyhow::Result<()> {
    let id = ItemId::new(raw_id)?;
    let Some(store) = open_existing_artifact_store(&config.output)? else {
        bail!("No artifact stored for {}", id);
    };

    match store.get(&id)? {
        Some(html) => {
            println!("{}", html);
            Ok(())
        }
        None => bail!("No artifact stored for {}", id),
    }
}

/// Handles the main batch run
async fn handle_run(
    config: Config,
    config_hash: String,
    raw_ids: Vec<String>,
    force: bool,
    report_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    if raw_ids.is_empty() {
        bail!("No item IDs given (pass IDs as arguments or use --ids-file)");
    }

    let template = UrlTemplate::new(config.fetch.url_template.as_str())?;
    let profile = load_profile(&config)?.map(Arc::new);
    let store = open_artifact_store(&config.output).context("Failed to open artifact store")?;
    let renderer = build_renderer(&config.renderer)
        .await
        .context("Failed to start renderer")?;

    let options = BatchOptions {
        force,
        ..BatchOptions::from(&config.fetch)
    };
    if force {
        tracing::info!("Forced run: stored artifacts will be refetched");
    }

    let fetcher = ItemFetcher::new(renderer, store, profile, options.render_timeout);
    let orchestrator = Orchestrator::new(fetcher, options);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing in-flight items");
                cancel.cancel();
            }
        })
    };

    let started_at = Utc::now();
    let results = orchestrator.run(raw_ids, &template, cancel.clone()).await;
    ctrl_c.abort();
    let results = results?;

    print_statistics(&collect_statistics(&results));

    if let Some(path) = report_path {
        let report = BatchReport::new(started_at, config_hash, cancel.is_cancelled(), &results);
        write_json_report(&report, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("\n✓ Report written to: {}", path.display());
    }

    Ok(())
}
