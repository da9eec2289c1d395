//! Artfetch CLI — batch conversion of catalog artwork to local WebP files.
//!
//! Configuration comes from ARTFETCH_* environment variables (see
//! artfetch-core's config module), overridable per flag.

use std::path::PathBuf;

use anyhow::Context;
use artfetch_cli::{init_tracing, parse_input_pair};
use artfetch_core::{ConvertConfig, RunSummary};
use artfetch_processing::AssetPipeline;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "artfetch", about = "Catalog artwork fetch and conversion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch referenced artwork, convert it to bounded WebP, and relink records
    Convert {
        /// Input record documents as media_type=path pairs
        /// (default: movies=movies_data.json series=series_data.json)
        #[arg(long = "input", value_parser = parse_input_pair)]
        inputs: Vec<(String, PathBuf)>,
        /// Base directory for converted artwork
        #[arg(long)]
        output: Option<PathBuf>,
        /// WebP quality, 0-100 (lower = smaller)
        #[arg(long)]
        quality: Option<f32>,
        /// Maximum output width in pixels
        #[arg(long)]
        max_width: Option<u32>,
        /// Concurrency cap for in-flight tasks
        #[arg(long)]
        workers: Option<usize>,
        /// Per-request fetch timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            inputs,
            output,
            quality,
            max_width,
            workers,
            timeout,
        } => {
            let mut config = ConvertConfig::from_env();
            if let Some(output) = output {
                config.output_base = output;
            }
            if let Some(quality) = quality {
                config.quality = quality;
            }
            if let Some(max_width) = max_width {
                config.max_width = max_width;
            }
            if let Some(workers) = workers {
                config.max_workers = workers;
            }
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }

            let inputs = if inputs.is_empty() {
                vec![
                    ("movies".to_string(), PathBuf::from("movies_data.json")),
                    ("series".to_string(), PathBuf::from("series_data.json")),
                ]
            } else {
                inputs
            };

            run_convert(config, inputs).await
        }
    }
}

async fn run_convert(config: ConvertConfig, inputs: Vec<(String, PathBuf)>) -> anyhow::Result<()> {
    let pipeline = AssetPipeline::new(config).context("failed to build pipeline")?;

    let mut totals = RunSummary::default();
    for (media_type, path) in inputs {
        if !path.exists() {
            tracing::warn!(
                media_type = %media_type,
                path = %path.display(),
                "input document not found, skipping"
            );
            continue;
        }
        // One bad document never aborts the rest of the run.
        match pipeline.process_document(&path, &media_type).await {
            Ok(summary) => totals.merge(&summary),
            Err(e) => {
                tracing::error!(media_type = %media_type, path = %path.display(), error = ?e, "failed to process document");
            }
        }
    }

    tracing::info!(
        succeeded = totals.succeeded,
        failed = totals.failed,
        source_mb = %format!("{:.2}", totals.source_megabytes()),
        output_mb = %format!("{:.2}", totals.output_megabytes()),
        saving = %format!("{:.1}%", totals.saving_percent()),
        output_dir = %pipeline.config().output_base.display(),
        "run summary"
    );

    Ok(())
}
