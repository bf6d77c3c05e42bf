//! Stage 1: normalize
//!
//! Canonicalizes field presence and metadata-key casing, repairs a stale
//! `length`, and drops whitespace-only chunks. A chunk missing `id` or
//! `document_id` is structurally invalid and fails the whole invocation
//! with a query error; everything else degrades gracefully.

use cairn_core::{Chunk, Result};

use crate::metrics::StageMetrics;

pub fn normalize(chunks: Vec<Chunk>, metrics: &mut StageMetrics) -> Result<Vec<Chunk>> {
    metrics.input = chunks.len();

    let mut output = Vec::with_capacity(chunks.len());
    for mut chunk in chunks {
        chunk.validate()?;

        if chunk.text.trim().is_empty() {
            metrics.dropped += 1;
            continue;
        }

        // length is derivable; repair rather than reject
        chunk.length = chunk.text.len();

        // metadata keys are matched case-insensitively downstream
        chunk.metadata = chunk
            .metadata
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        output.push(chunk);
    }

    metrics.output = output.len();
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::Error;
    use serde_json::json;

    #[test]
    fn drops_whitespace_only_chunks() {
        let chunks = vec![
            Chunk::new("c1", "doc1", "real content", 0),
            Chunk::new("c2", "doc1", "   \n\t ", 20),
            Chunk::new("c3", "doc1", "", 30),
        ];
        let mut metrics = StageMetrics::default();
        let out = normalize(chunks, &mut metrics).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(metrics.input, 3);
        assert_eq!(metrics.dropped, 2);
        assert_eq!(metrics.output, 1);
    }

    #[test]
    fn lowercases_metadata_keys_and_repairs_length() {
        let mut chunk = Chunk::new("c1", "doc1", "abc", 0).with_metadata("Source-File", json!("a.md"));
        chunk.length = 999;

        let mut metrics = StageMetrics::default();
        let out = normalize(vec![chunk], &mut metrics).unwrap();
        assert_eq!(out[0].length, 3);
        assert!(out[0].metadata.contains_key("source-file"));
    }

    #[test]
    fn missing_document_id_is_a_query_error() {
        let chunk = Chunk::new("c1", "", "abc", 0);
        let mut metrics = StageMetrics::default();
        assert!(matches!(
            normalize(vec![chunk], &mut metrics),
            Err(Error::Query(_))
        ));
    }
}
