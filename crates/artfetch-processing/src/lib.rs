//! Artwork fetch, transform, and orchestration stages.
//!
//! The pipeline turns catalog records referencing remote artwork into local
//! WebP files plus an updated record document: fetch each referenced image,
//! flatten and bound its dimensions, encode as WebP, persist under a
//! deterministic path, and relink the records to whatever landed on disk.

pub mod fetch;
pub mod pipeline;
pub mod transform;

pub use fetch::ImageFetcher;
pub use pipeline::AssetPipeline;
pub use transform::{ArtworkTransformer, TransformOptions};
