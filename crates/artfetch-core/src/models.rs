//! Domain models for the artwork fetch-transform pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One catalog entry as read from the input document. Each of the three image
/// slots may be absent, null, or carry the literal placeholder `"None"`, all of
/// which mean "no artwork for this slot".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub backdrop: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl CatalogRecord {
    /// Returns the source URL for a slot, filtering out empty strings and the
    /// `"None"` placeholder the upstream extraction stage emits.
    pub fn slot_url(&self, slot: ImageSlot) -> Option<&str> {
        let value = match slot {
            ImageSlot::Poster => self.poster.as_deref(),
            ImageSlot::Backdrop => self.backdrop.as_deref(),
            ImageSlot::Logo => self.logo.as_deref(),
        };
        value.filter(|url| !url.is_empty() && *url != "None")
    }
}

/// The three artwork roles a catalog record may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Poster,
    Backdrop,
    Logo,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 3] = [ImageSlot::Poster, ImageSlot::Backdrop, ImageSlot::Logo];

    /// Filename suffix and log label, e.g. `poster`.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSlot::Poster => "poster",
            ImageSlot::Backdrop => "backdrop",
            ImageSlot::Logo => "logo",
        }
    }

    /// Output directory segment, e.g. `posters`.
    pub fn dir_name(self) -> &'static str {
        match self {
            ImageSlot::Poster => "posters",
            ImageSlot::Backdrop => "backdrops",
            ImageSlot::Logo => "logos",
        }
    }
}

impl std::fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetch-transform-persist unit of work: a single slot of a single record.
/// `index` is the record's 1-based ordinal in the input sequence and is part of
/// the destination filename.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub index: usize,
    pub slot: ImageSlot,
    pub url: String,
    pub dest: PathBuf,
}

/// Output shape: same as [`CatalogRecord`] but each slot holds a verified local
/// path or null. A slot is set only after the destination file has been
/// confirmed present on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub title: String,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub logo: Option<String>,
}

impl OutputRecord {
    pub fn new(title: String) -> Self {
        Self {
            title,
            poster: None,
            backdrop: None,
            logo: None,
        }
    }

    pub fn set_slot(&mut self, slot: ImageSlot, path: String) {
        match slot {
            ImageSlot::Poster => self.poster = Some(path),
            ImageSlot::Backdrop => self.backdrop = Some(path),
            ImageSlot::Logo => self.logo = Some(path),
        }
    }

    pub fn slot(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Poster => self.poster.as_deref(),
            ImageSlot::Backdrop => self.backdrop.as_deref(),
            ImageSlot::Logo => self.logo.as_deref(),
        }
    }
}

/// Aggregate counters for one run. Exactly one increment per task; byte totals
/// only accumulate for tasks that completed and were verified on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: u64,
    pub failed: u64,
    pub source_bytes: u64,
    pub output_bytes: u64,
}

impl RunSummary {
    pub fn record_success(&mut self, source_bytes: u64, output_bytes: u64) {
        self.succeeded += 1;
        self.source_bytes += source_bytes;
        self.output_bytes += output_bytes;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.source_bytes += other.source_bytes;
        self.output_bytes += other.output_bytes;
    }

    /// Total tasks accounted for; equals the number of non-absent URL slots
    /// across all processed records.
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn source_megabytes(&self) -> f64 {
        self.source_bytes as f64 / 1024.0 / 1024.0
    }

    pub fn output_megabytes(&self) -> f64 {
        self.output_bytes as f64 / 1024.0 / 1024.0
    }

    /// Overall size saving as a percentage. Zero source bytes yields 0.0 rather
    /// than a division by zero (individual zero-byte payloads are already
    /// rejected at the fetch stage).
    pub fn saving_percent(&self) -> f64 {
        if self.source_bytes == 0 {
            return 0.0;
        }
        let saved = self.source_bytes.saturating_sub(self.output_bytes) as f64;
        saved / self.source_bytes as f64 * 100.0
    }
}
