//! Pipeline-internal and pipeline-terminal context types
//!
//! [`ContextGroup`] is transient: created by the merge stage, consumed by the
//! pack stage within a single pipeline invocation. [`PackedContext`] is the
//! pipeline's output and the synthesis stage's input.

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

/// Ordered chunks from one document after grouping and merging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextGroup {
    pub document_id: String,
    pub chunks: Vec<Chunk>,
    /// Concatenated, overlap-trimmed text of the member chunks
    pub combined_text: String,
    /// `(min offset, max offset + length)` over the member chunks
    pub span: (usize, usize),
}

impl ContextGroup {
    /// Aggregate relevance of the group: maximum member score
    ///
    /// Max rather than mean, so one strong chunk keeps its document
    /// competitive during packing. `None` when no member carries a score.
    pub fn aggregate_score(&self) -> Option<f32> {
        self.chunks
            .iter()
            .filter_map(|c| c.score)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f32| a.max(s))))
    }

    /// Identifier used for provenance: the first member chunk's id
    pub fn source_id(&self) -> &str {
        self.chunks.first().map(|c| c.id.as_str()).unwrap_or(&self.document_id)
    }

    /// Byte length of the combined text
    pub fn size(&self) -> usize {
        self.combined_text.len()
    }
}

/// One citation-ready entry of the packed context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedEntry {
    /// Citation marker label, e.g. `S1`
    pub label: String,
    pub text: String,
    /// Chunk or document id this entry's text came from
    pub source_id: String,
    pub document_id: String,
}

/// Budget-bounded, attributable context block
///
/// Guarantee: `total_size` is the sum of entry text byte lengths and never
/// exceeds the budget the pipeline was configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackedContext {
    pub entries: Vec<PackedEntry>,
    pub total_size: usize,
}

impl PackedContext {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its citation label
    pub fn entry_for_label(&self, label: &str) -> Option<&PackedEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}
