//! Pipeline orchestration
//!
//! Runs the five stages in order and aggregates their metrics. The caller's
//! cooperative deadline is checked before each stage; stages themselves are
//! bounded and fast, so mid-stage cancellation is not needed.

use cairn_core::{Chunk, Error, PackConfig, PackedContext, Result, RunOptions};

use crate::metrics::PipelineMetrics;
use crate::steps;

/// Five-stage transform from raw retrieval output to a packed context
#[derive(Debug, Clone, Default)]
pub struct ContextPipeline {
    config: PackConfig,
}

impl ContextPipeline {
    pub fn new(config: PackConfig) -> Self {
        Self { config }
    }

    /// Run the five stages in order.
    ///
    /// `max_sources` bounds the number of packed entries (already reduced to
    /// the effective limit by the caller). Returns the packed context plus
    /// per-stage metrics; data-quality issues surface only in the metrics.
    pub fn process(
        &self,
        chunks: Vec<Chunk>,
        max_sources: Option<usize>,
        run: &RunOptions,
    ) -> Result<(PackedContext, PipelineMetrics)> {
        let mut metrics = PipelineMetrics::default();

        check_deadline(run, "normalize")?;
        let normalized = steps::normalize(chunks, &mut metrics.normalize)?;

        check_deadline(run, "dedupe")?;
        let deduped = steps::dedupe(normalized, &mut metrics.dedupe);

        check_deadline(run, "group")?;
        let grouped = steps::group_by_document(deduped, &mut metrics.group);

        check_deadline(run, "merge")?;
        let merged = steps::merge_adjacent(grouped, self.config.tolerance, &mut metrics.merge);

        check_deadline(run, "pack")?;
        let packed = steps::pack_window(merged, self.config.budget, max_sources, &mut metrics.pack);

        tracing::debug!(
            input = metrics.normalize.input,
            packed = metrics.pack.output,
            dropped = metrics.total_dropped(),
            "context pipeline finished"
        );
        Ok((packed, metrics))
    }
}

/// Deadline expiry counts as caller-initiated cancellation
fn check_deadline(run: &RunOptions, stage: &str) -> Result<()> {
    if run.expired() {
        return Err(Error::Query(format!("deadline exceeded before {stage} stage")));
    }
    Ok(())
}
