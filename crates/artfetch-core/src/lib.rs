//! Artfetch Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, and
//! filename sanitization shared across all artfetch components. It performs no
//! I/O of its own.

pub mod config;
pub mod error;
pub mod models;
pub mod sanitize;

// Re-export commonly used types
pub use config::ConvertConfig;
pub use error::PipelineError;
pub use models::{CatalogRecord, FetchTask, ImageSlot, OutputRecord, RunSummary};
pub use sanitize::sanitize_title;
