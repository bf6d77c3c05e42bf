//! Side-channel stage metrics
//!
//! Stages report drop/merge/truncate counts here instead of raising, so the
//! pipeline stays total over messy input while remaining observable and
//! assertable in tests.

use serde::Serialize;

/// Counters for one pipeline stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageMetrics {
    /// Items the stage received
    pub input: usize,
    /// Items the stage emitted
    pub output: usize,
    /// Items discarded (empty text, duplicate content, unpackable entries)
    pub dropped: usize,
    /// Chunks folded into a neighbouring entry by the merge stage
    pub merged: usize,
    /// Entries cut at a text boundary to fit the remaining budget
    pub truncated: usize,
}

/// Aggregated metrics for one pipeline invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    pub normalize: StageMetrics,
    pub dedupe: StageMetrics,
    pub group: StageMetrics,
    pub merge: StageMetrics,
    pub pack: StageMetrics,
}

impl PipelineMetrics {
    /// Total items dropped across all stages
    pub fn total_dropped(&self) -> usize {
        self.normalize.dropped
            + self.dedupe.dropped
            + self.group.dropped
            + self.merge.dropped
            + self.pack.dropped
    }
}
