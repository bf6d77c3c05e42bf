//! Context processing pipeline for Cairn
//!
//! Turns heterogeneous retrieval output into one bounded, attributable
//! context block through five ordered stages: normalize, dedupe, group,
//! merge, pack. Data-quality issues never raise; they degrade gracefully
//! and are counted in [`PipelineMetrics`]. Only a chunk missing `id` or
//! `document_id` is an error.

pub mod metrics;
pub mod pipeline;
pub mod steps;

pub use metrics::{PipelineMetrics, StageMetrics};
pub use pipeline::ContextPipeline;
