//! Error taxonomy for the pipeline.
//!
//! Every variant is caught at the task boundary, logged with enough context to
//! identify the source URL or file, and converted into a per-task failure. No
//! error aborts the run or other tasks; there is no retry.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Network transport error, timeout, non-2xx status, or an empty payload.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Corrupt or unsupported image payload.
    #[error("Decode error: {0}")]
    Decode(String),

    /// WebP compression failure.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Directory creation or file write failure.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
