//! Per-source ingest pipeline.
//!
//! Every locator runs fetch → open bundle → walk → build → atomic write on its
//! own. A failing source is recorded in the run summary and never stops the
//! others; only failing to prepare the output directory aborts the run.

mod convert;
mod output;
mod sources;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::fetch::{SourceFetcher, DEFAULT_ENTRY_PATH};
use crate::models::ImportRun;
use crate::sql::BatchOptions;

pub use convert::{document_to_sql, source_to_sql, Conversion};
pub use output::{write_atomic, write_combined, write_manifest, MANIFEST_NAME};
pub use sources::{load_source_list, parse_source_list};

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving one `<import id>.sql` artifact per source
    pub out_dir: PathBuf,
    /// Path of the document inside each bundle
    pub entry_path: String,
    /// Sources processed at the same time; 1 processes them in order
    pub concurrency: usize,
    /// Skip sources whose artifact already exists
    pub skip_existing: bool,
    pub batch: BatchOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data"),
            entry_path: DEFAULT_ENTRY_PATH.to_string(),
            concurrency: 1,
            skip_existing: false,
            batch: BatchOptions::default(),
        }
    }
}

/// What happened to one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceStatus {
    Written {
        artifact: PathBuf,
        areas: usize,
        degenerate: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub locator: String,
    pub import_id: Uuid,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Outcomes of a run, in source list order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Written { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Skipped { .. }))
    }

    /// Total areas written across all sources
    pub fn areas(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                SourceStatus::Written { areas, .. } => *areas,
                _ => 0,
            })
            .sum()
    }

    /// Paths of the artifacts written by this run
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            SourceStatus::Written { artifact, .. } => Some(artifact.as_path()),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&SourceStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Drives the sources of one run
pub struct Pipeline {
    fetcher: SourceFetcher,
    config: PipelineConfig,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(fetcher: SourceFetcher, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Flag that stops sources from starting once set; sources already in
    /// flight run to completion
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Process every locator and report the outcome of each
    pub async fn run(&self, locators: &[String], progress: &ProgressBar) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&self.config.out_dir).await?;

        let concurrency = self.config.concurrency.max(1);
        info!(
            "Processing {} sources into {} ({} at a time)",
            locators.len(),
            self.config.out_dir.display(),
            concurrency
        );

        let mut seen = HashSet::new();
        let jobs: Vec<(usize, &str, bool)> = locators
            .iter()
            .enumerate()
            .map(|(index, locator)| (index, locator.as_str(), seen.insert(locator.as_str())))
            .collect();

        let mut outcomes: Vec<(usize, SourceOutcome)> = stream::iter(jobs)
            .map(|(index, locator, first)| async move {
                let outcome = if first {
                    self.process(locator).await
                } else {
                    skipped(locator, "duplicate locator")
                };
                progress.inc(1);
                (index, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);

        let summary = RunSummary {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        };

        info!(
            "Run finished: {} written, {} failed, {} skipped, {} areas",
            summary.succeeded(),
            summary.failed(),
            summary.skipped(),
            summary.areas()
        );

        Ok(summary)
    }

    async fn process(&self, locator: &str) -> SourceOutcome {
        if self.cancelled.load(Ordering::SeqCst) {
            return skipped(locator, "cancelled");
        }

        let import = ImportRun::from_locator(locator);
        let status = match self.process_source(&import).await {
            Ok(status) => status,
            Err(e) => {
                error!("Source {} failed: {}", locator, e);
                SourceStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        SourceOutcome {
            locator: locator.to_string(),
            import_id: import.id,
            status,
        }
    }

    async fn process_source(&self, import: &ImportRun) -> Result<SourceStatus> {
        let artifact = self.config.out_dir.join(import.artifact_name());

        if self.config.skip_existing && tokio::fs::try_exists(&artifact).await? {
            info!("Artifact for {} exists, skipping", import.name);
            return Ok(SourceStatus::Skipped {
                reason: "artifact exists".to_string(),
            });
        }

        info!("Fetching {}", import.name);
        let bytes = self.fetcher.fetch(&import.name).await?;

        // Parsing and writing are CPU/file work; a panic there stays
        // contained in this source's JoinError.
        let task_import = import.clone();
        let task_artifact = artifact.clone();
        let entry_path = self.config.entry_path.clone();
        let options = self.config.batch;

        let conversion = tokio::task::spawn_blocking(move || -> Result<Conversion> {
            let conversion = source_to_sql(&task_import, bytes, &entry_path, options)?;
            write_atomic(&task_artifact, conversion.sql.as_bytes())?;
            Ok(conversion)
        })
        .await
        .map_err(|e| IngestError::Worker(e.to_string()))??;

        let stats = conversion.stats;
        if stats.areas == 0 {
            warn!("{} produced no areas", import.name);
        }
        info!(
            "Wrote {} ({} areas, {} placemarks without a usable ring)",
            artifact.display(),
            stats.areas,
            stats.degenerate
        );

        Ok(SourceStatus::Written {
            artifact,
            areas: stats.areas,
            degenerate: stats.degenerate,
        })
    }
}

fn skipped(locator: &str, reason: &str) -> SourceOutcome {
    SourceOutcome {
        locator: locator.to_string(),
        import_id: ImportRun::from_locator(locator).id,
        status: SourceStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}
