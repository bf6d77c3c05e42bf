//! Stage 4: merge adjacent
//!
//! Within one document, chunks whose spans overlap or sit within the
//! configured byte tolerance are coalesced into a single [`ContextGroup`]
//! with overlap-trimmed, concatenated text. This reduces citation
//! fragmentation without fabricating text: overlapping bytes appear once,
//! tolerated gaps are joined with a single newline, and nothing is invented
//! to fill them.

use cairn_core::{Chunk, ContextGroup};

use crate::metrics::StageMetrics;
use crate::steps::group::DocumentChunks;

pub fn merge_adjacent(groups: Vec<DocumentChunks>, tolerance: usize, metrics: &mut StageMetrics) -> Vec<ContextGroup> {
    let mut output = Vec::new();

    for group in groups {
        metrics.input += group.chunks.len();

        // adjacency is a span property; order by offset for the scan
        let mut chunks = group.chunks;
        chunks.sort_by_key(|c| c.offset);

        let mut iter = chunks.into_iter();
        let Some(first) = iter.next() else { continue };
        let mut current = Builder::start(&group.document_id, first);

        for chunk in iter {
            if current.absorb(chunk, tolerance) {
                metrics.merged += 1;
            } else {
                // absorb returned the chunk's ownership via take_pending
                let next = current.take_pending();
                output.push(current.finish());
                current = Builder::start(&group.document_id, next);
            }
        }
        output.push(current.finish());
    }

    metrics.output = output.len();
    output
}

/// Accumulates one contiguous run of chunks
struct Builder {
    document_id: String,
    chunks: Vec<Chunk>,
    combined_text: String,
    span: (usize, usize),
    pending: Option<Chunk>,
}

impl Builder {
    fn start(document_id: &str, chunk: Chunk) -> Self {
        let span = chunk.span();
        let combined_text = chunk.text.clone();
        Self {
            document_id: document_id.to_string(),
            chunks: vec![chunk],
            combined_text,
            span,
            pending: None,
        }
    }

    /// Try to fold `chunk` into the current run. Returns false (and parks
    /// the chunk in `pending`) when the gap exceeds the tolerance.
    fn absorb(&mut self, chunk: Chunk, tolerance: usize) -> bool {
        let (start, end) = chunk.span();
        let current_end = self.span.1;

        if start > current_end + tolerance {
            self.pending = Some(chunk);
            return false;
        }

        if start >= current_end {
            // gap within tolerance: join without inventing the missing bytes
            if !chunk.text.is_empty() {
                self.combined_text.push('\n');
                self.combined_text.push_str(&chunk.text);
            }
        } else {
            // overlap: trim the bytes already present
            let overlap = current_end - start;
            if overlap < chunk.text.len() {
                let cut = ceil_char_boundary(&chunk.text, overlap);
                self.combined_text.push_str(&chunk.text[cut..]);
            }
            // fully contained chunks contribute no new text
        }

        self.span.1 = self.span.1.max(end);
        self.chunks.push(chunk);
        true
    }

    fn take_pending(&mut self) -> Chunk {
        self.pending.take().expect("absorb reported a break without a pending chunk")
    }

    fn finish(self) -> ContextGroup {
        ContextGroup {
            document_id: self.document_id,
            chunks: self.chunks,
            combined_text: self.combined_text,
            span: self.span,
        }
    }
}

/// Smallest char boundary in `text` that is >= `index`
fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
