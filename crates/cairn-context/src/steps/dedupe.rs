//! Stage 2: dedupe
//!
//! Content-based deduplication over the md5 hash of whitespace-normalized
//! text: two chunks with different ids but identical content collapse to
//! one. On collision the higher-scored chunk wins its first-seen position;
//! equal or absent scores keep the first-seen chunk (stable).

use std::collections::HashMap;

use cairn_core::Chunk;

use crate::metrics::StageMetrics;

pub fn dedupe(chunks: Vec<Chunk>, metrics: &mut StageMetrics) -> Vec<Chunk> {
    metrics.input = chunks.len();

    let mut kept: Vec<Chunk> = Vec::with_capacity(chunks.len());
    let mut index_by_hash: HashMap<String, usize> = HashMap::new();

    for chunk in chunks {
        let hash = chunk.content_hash();
        match index_by_hash.get(&hash) {
            None => {
                index_by_hash.insert(hash, kept.len());
                kept.push(chunk);
            }
            Some(&i) => {
                metrics.dropped += 1;
                // strictly higher score replaces the kept duplicate in place
                if score_of(&chunk) > score_of(&kept[i]) {
                    kept[i] = chunk;
                }
            }
        }
    }

    metrics.output = kept.len();
    kept
}

fn score_of(chunk: &Chunk) -> f32 {
    chunk.score.unwrap_or(f32::NEG_INFINITY)
}
