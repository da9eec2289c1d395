//! Configuration module
//!
//! Settings for the conversion pipeline, loaded from environment variables with
//! sensible defaults. CLI flags may override any of these at the entry point.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_QUALITY: f32 = 75.0;
const DEFAULT_MAX_WIDTH: u32 = 1920;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_WORKERS: usize = 5;
const DEFAULT_OUTPUT_DIR: &str = "converted_images";

/// Conversion pipeline configuration.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// WebP quality, 0-100. Lower means smaller and lossier.
    pub quality: f32,
    /// Maximum output width in pixels; wider images are downscaled, narrower
    /// ones are left at native resolution.
    pub max_width: u32,
    /// Per-request fetch timeout in seconds.
    pub timeout_secs: u64,
    /// Concurrency cap for in-flight fetch+transform tasks.
    pub max_workers: usize,
    /// Base directory for converted artwork.
    pub output_base: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_width: DEFAULT_MAX_WIDTH,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_workers: DEFAULT_MAX_WORKERS,
            output_base: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ConvertConfig {
    /// Load configuration from `ARTFETCH_*` environment variables, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            quality: env_parse("ARTFETCH_QUALITY", DEFAULT_QUALITY),
            max_width: env_parse("ARTFETCH_MAX_WIDTH", DEFAULT_MAX_WIDTH),
            timeout_secs: env_parse("ARTFETCH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            max_workers: env_parse("ARTFETCH_MAX_WORKERS", DEFAULT_MAX_WORKERS),
            output_base: env::var("ARTFETCH_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        }
    }

    /// Clamp values into their valid ranges. Quality is bounded to 0-100 and
    /// the worker cap must be at least 1.
    pub fn normalized(mut self) -> Self {
        self.quality = self.quality.clamp(0.0, 100.0);
        self.max_workers = self.max_workers.max(1);
        self.max_width = self.max_width.max(1);
        self
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
