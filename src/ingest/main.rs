//! Airspace feed ingest.
//!
//! Downloads KMZ airspace bundles, extracts their polygons and writes one
//! PostGIS SQL batch per source.

mod config;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use airspace::discord::DiscordWebhook;
use airspace::fetch::{FetchSettings, SourceFetcher, DEFAULT_ENTRY_PATH};
use airspace::pipeline::{
    load_source_list, write_atomic, write_combined, write_manifest, Pipeline, PipelineConfig,
    SourceStatus,
};
use airspace::sql::{schema_sql, BatchOptions};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Convert KMZ airspace feeds into PostGIS SQL batches")]
struct Args {
    /// File with one source URL or path per line
    #[arg(short, long)]
    sources: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the per-source SQL artifacts
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Number of sources processed at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Path of the KML document inside each bundle
    #[arg(long)]
    entry_path: Option<String>,

    /// Also write all artifacts concatenated into this file
    #[arg(long)]
    combined: Option<PathBuf>,

    /// Write the table definitions to this file
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Prefix each batch with a delete of its previous import
    #[arg(long)]
    replace: bool,

    /// Skip sources whose artifact already exists
    #[arg(long)]
    skip_existing: bool,

    /// Download attempts per source, including the first one
    #[arg(long)]
    max_attempts: Option<u32>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Discord webhook URL for the run summary (optional)
    #[arg(long)]
    discord_webhook: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Airspace Ingest");

    let config = match &args.config {
        Some(path) => {
            info!("Config: {}", path.display());
            Config::load_from_file(path)?
        }
        None => Config::default(),
    };
    let global = &config.global;

    // Collect sources: config entries first, then the list file
    let mut locators = Vec::new();
    for source in &config.sources {
        if let Some(ref name) = source.name {
            info!("Source {}: {}", name, source.url);
        }
        locators.push(source.url.clone());
    }
    if let Some(path) = &args.sources {
        info!("Source list: {}", path.display());
        locators.extend(load_source_list(path)?);
    }
    if locators.is_empty() {
        anyhow::bail!("No sources given; use --sources or [[sources]] in the config file");
    }

    let mut fetch_settings = FetchSettings::default();
    if let Some(attempts) = args.max_attempts.or(global.max_attempts) {
        fetch_settings.max_attempts = attempts;
    }
    if let Some(secs) = args.timeout_secs.or(global.timeout_secs) {
        fetch_settings.timeout = Duration::from_secs(secs);
    }
    if let Some(agent) = &global.user_agent {
        fetch_settings.user_agent = agent.clone();
    }
    let fetcher = SourceFetcher::new(&fetch_settings).context("Failed to create HTTP client")?;

    let pipeline_config = PipelineConfig {
        out_dir: args
            .out_dir
            .clone()
            .or_else(|| global.out_dir.clone())
            .unwrap_or_else(|| PathBuf::from("data")),
        entry_path: args
            .entry_path
            .clone()
            .or_else(|| global.entry_path.clone())
            .unwrap_or_else(|| DEFAULT_ENTRY_PATH.to_string()),
        concurrency: args.concurrency.or(global.concurrency).unwrap_or(1),
        skip_existing: args.skip_existing || global.skip_existing,
        batch: BatchOptions {
            replace_existing: args.replace || global.replace_existing,
        },
    };
    let out_dir = pipeline_config.out_dir.clone();

    let pipeline = Pipeline::new(fetcher, pipeline_config);

    // Stop starting new sources on Ctrl-C; in-flight ones finish
    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for in-flight sources to finish");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let pb = ProgressBar::new(locators.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let summary = pipeline
        .run(&locators, &pb)
        .await
        .with_context(|| format!("Failed to prepare output directory {}", out_dir.display()))?;

    pb.finish_with_message("Processing complete");

    write_manifest(&out_dir, &summary).context("Failed to write manifest")?;

    if let Some(path) = args.combined.as_ref().or(global.combined_output.as_ref()) {
        let count = write_combined(path, &summary)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Combined {} artifacts into {}", count, path.display());
    }

    if let Some(path) = args.schema.as_ref().or(global.schema_output.as_ref()) {
        write_atomic(path, schema_sql().as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote schema to {}", path.display());
    }

    for outcome in &summary.outcomes {
        match &outcome.status {
            SourceStatus::Written { artifact, areas, .. } => {
                info!("OK      {} -> {} ({} areas)", outcome.locator, artifact.display(), areas)
            }
            SourceStatus::Skipped { reason } => {
                info!("SKIPPED {} ({})", outcome.locator, reason)
            }
            SourceStatus::Failed { error } => warn!("FAILED  {}: {}", outcome.locator, error),
        }
    }
    info!(
        "{} of {} sources written, {} failed",
        summary.succeeded(),
        summary.outcomes.len(),
        summary.failed()
    );

    let webhook = args
        .discord_webhook
        .clone()
        .or_else(|| global.discord_webhook.clone());
    if let Some(url) = webhook {
        if let Err(e) = DiscordWebhook::new(url).notify_run(&summary).await {
            warn!("Could not send run summary: {}", e);
        }
    }

    Ok(())
}
