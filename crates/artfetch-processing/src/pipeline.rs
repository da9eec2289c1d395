//! Orchestration stage: plan one task per referenced image, run the batch
//! under a fixed worker cap, and rebuild the record document from whatever
//! landed on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use artfetch_core::{
    sanitize_title, CatalogRecord, ConvertConfig, FetchTask, ImageSlot, OutputRecord,
    PipelineError, RunSummary,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::ImageFetcher;
use crate::transform::{ArtworkTransformer, TransformOptions};

/// Per-task result reported back to the collector. Byte sizes are present only
/// when the task fetched, transformed, and persisted successfully.
#[derive(Debug, Clone, Copy)]
struct TaskOutcome {
    index: usize,
    slot: ImageSlot,
    bytes: Option<(u64, u64)>,
}

impl TaskOutcome {
    fn failed(task: &FetchTask) -> Self {
        Self {
            index: task.index,
            slot: task.slot,
            bytes: None,
        }
    }
}

/// Batch pipeline for one run. Tasks are independent; the only shared state is
/// the HTTP connection pool and the output directory tree, where every task
/// writes a distinct path. Counters are folded by the collector from returned
/// outcomes, one per task, so no increment can be lost or doubled.
pub struct AssetPipeline {
    fetcher: ImageFetcher,
    config: ConvertConfig,
}

impl AssetPipeline {
    pub fn new(config: ConvertConfig) -> Result<Self, PipelineError> {
        let config = config.normalized();
        let fetcher = ImageFetcher::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Expand records into one task per non-absent URL slot. Destination paths
    /// are deterministic:
    /// `{base}/{media_type}/{slot_plural}/{index}_{safe_title}_{slot}.webp`.
    pub fn plan_tasks(
        records: &[CatalogRecord],
        media_type: &str,
        output_base: &Path,
    ) -> Vec<FetchTask> {
        let mut tasks = Vec::new();
        for (ordinal, record) in records.iter().enumerate() {
            let index = ordinal + 1;
            let safe_title = sanitize_title(&record.title, index);
            for slot in ImageSlot::ALL {
                if let Some(url) = record.slot_url(slot) {
                    let filename = format!("{index}_{safe_title}_{}.webp", slot.as_str());
                    let dest = output_base
                        .join(media_type)
                        .join(slot.dir_name())
                        .join(filename);
                    tasks.push(FetchTask {
                        index,
                        slot,
                        url: url.to_string(),
                        dest,
                    });
                }
            }
        }
        tasks
    }

    /// Run the batch for one media type. Returns the relinked records and the
    /// counters for this batch. The run always completes, even if every task
    /// failed; failures surface only as log lines, the failure counter, and
    /// null slots in the output.
    pub async fn run(
        &self,
        records: &[CatalogRecord],
        media_type: &str,
    ) -> (Vec<OutputRecord>, RunSummary) {
        let tasks = Self::plan_tasks(records, media_type, &self.config.output_base);
        let total = tasks.len();
        tracing::info!(
            media_type,
            records = records.len(),
            tasks = total,
            max_workers = self.config.max_workers,
            "starting artwork batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let options = TransformOptions {
            max_width: self.config.max_width,
            quality: self.config.quality,
        };

        let mut join_set = JoinSet::new();
        for task in tasks.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // The semaphore is never closed while tasks are in flight.
                    Err(_) => return TaskOutcome::failed(&task),
                };
                Self::execute_task(&fetcher, task, options).await
            });
        }

        let mut summary = RunSummary::default();
        let mut completed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => match outcome.bytes {
                    Some((source, output)) => summary.record_success(source, output),
                    None => {
                        tracing::debug!(index = outcome.index, slot = %outcome.slot, "task failed");
                        summary.record_failure();
                    }
                },
                Err(e) => {
                    tracing::error!(error = %e, "artwork task aborted");
                    summary.record_failure();
                }
            }
            completed += 1;
            if completed % 10 == 0 {
                tracing::info!(completed, total, media_type, "batch progress");
            }
        }

        let outputs = Self::assemble_outputs(records, &tasks);
        tracing::info!(
            media_type,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "artwork batch finished"
        );
        (outputs, summary)
    }

    /// One fetch-transform-persist unit. Every error kind is caught here,
    /// logged with its URL or path context, and turned into a failed outcome.
    async fn execute_task(
        fetcher: &ImageFetcher,
        task: FetchTask,
        options: TransformOptions,
    ) -> TaskOutcome {
        let failed = TaskOutcome::failed(&task);

        let payload = match fetcher.fetch(&task.url).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(index = task.index, slot = %task.slot, error = %e, "fetch failed");
                return failed;
            }
        };
        let source_bytes = payload.len() as u64;

        // Decode and encode are CPU-bound; run off the async pool.
        let encoded = match tokio::task::spawn_blocking(move || {
            ArtworkTransformer::transform(&payload, options)
        })
        .await
        {
            Ok(Ok(encoded)) => encoded,
            Ok(Err(e)) => {
                tracing::warn!(url = %task.url, error = %e, "transform failed");
                return failed;
            }
            Err(e) => {
                tracing::error!(url = %task.url, error = %e, "transform task panicked");
                return failed;
            }
        };

        if let Err(e) = ArtworkTransformer::persist(&encoded, &task.dest) {
            tracing::warn!(url = %task.url, error = %e, "persist failed");
            return failed;
        }

        let output_bytes = encoded.len() as u64;
        let reduction =
            source_bytes.saturating_sub(output_bytes) as f64 / source_bytes as f64 * 100.0;
        tracing::info!(
            file = %task.dest.file_name().unwrap_or_default().to_string_lossy(),
            source_kb = %format!("{:.1}", source_bytes as f64 / 1024.0),
            output_kb = %format!("{:.1}", output_bytes as f64 / 1024.0),
            reduction = %format!("{reduction:.1}%"),
            "converted"
        );

        TaskOutcome {
            index: task.index,
            slot: task.slot,
            bytes: Some((source_bytes, output_bytes)),
        }
    }

    /// Rebuild one output record per input record. A slot is relinked only when
    /// its destination file is confirmed present on disk; a task success flag
    /// alone is not trusted.
    pub fn assemble_outputs(records: &[CatalogRecord], tasks: &[FetchTask]) -> Vec<OutputRecord> {
        let mut outputs: Vec<OutputRecord> = records
            .iter()
            .map(|record| OutputRecord::new(record.title.clone()))
            .collect();
        for task in tasks {
            if task.dest.is_file() {
                if let Some(output) = outputs.get_mut(task.index - 1) {
                    output.set_slot(task.slot, task.dest.to_string_lossy().into_owned());
                }
            }
        }
        outputs
    }

    /// Process one input document end to end: read records, run the batch, and
    /// write the relinked document once, after the whole batch finishes.
    pub async fn process_document(
        &self,
        input: &Path,
        media_type: &str,
    ) -> anyhow::Result<RunSummary> {
        let raw = fs::read_to_string(input)
            .with_context(|| format!("failed to read input document {}", input.display()))?;
        let records: Vec<CatalogRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid record document {}", input.display()))?;

        let (outputs, summary) = self.run(&records, media_type).await;

        let out_path = Self::output_document_path(input);
        let body = serde_json::to_string_pretty(&outputs).context("serialize output records")?;
        fs::write(&out_path, body)
            .with_context(|| format!("failed to write output document {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), media_type, "wrote updated record document");

        Ok(summary)
    }

    /// Sibling path for the output document: `_webp` appended before the
    /// extension (`movies_data.json` becomes `movies_data_webp.json`).
    pub fn output_document_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string());
        let name = match input.extension() {
            Some(ext) => format!("{stem}_webp.{}", ext.to_string_lossy()),
            None => format!("{stem}_webp"),
        };
        input.with_file_name(name)
    }
}
