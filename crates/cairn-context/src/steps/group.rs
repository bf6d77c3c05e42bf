//! Stage 3: group by document
//!
//! Partitions the deduplicated sequence by `document_id`. Document order is
//! the order of each document's first appearance; chunk order within a
//! document is the original retrieval rank, not offset order.

use std::collections::HashMap;

use cairn_core::Chunk;

use crate::metrics::StageMetrics;

/// One document's chunks in retrieval-rank order
#[derive(Debug, Clone)]
pub struct DocumentChunks {
    pub document_id: String,
    pub chunks: Vec<Chunk>,
}

pub fn group_by_document(chunks: Vec<Chunk>, metrics: &mut StageMetrics) -> Vec<DocumentChunks> {
    metrics.input = chunks.len();

    let mut groups: Vec<DocumentChunks> = Vec::new();
    let mut index_by_doc: HashMap<String, usize> = HashMap::new();

    for chunk in chunks {
        match index_by_doc.get(&chunk.document_id) {
            Some(&i) => groups[i].chunks.push(chunk),
            None => {
                index_by_doc.insert(chunk.document_id.clone(), groups.len());
                groups.push(DocumentChunks {
                    document_id: chunk.document_id.clone(),
                    chunks: vec![chunk],
                });
            }
        }
    }

    metrics.output = groups.len();
    groups
}
