//! Canonical chunk and document records
//!
//! A [`Chunk`] is the smallest retrievable unit of document text. Chunks are
//! produced by ingestion or retrieval, owned read-only by the pipeline for
//! the duration of one query, and identified by `id`. Content equality for
//! deduplication purposes is defined by [`Chunk::content_hash`], not by id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Smallest retrievable unit of document text
///
/// Invariant: `length == text.len()` (bytes). `score` is only meaningful
/// after retrieval or rerank; it is absent on freshly ingested chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub text: String,
    /// Byte offset of this chunk within its parent document
    pub offset: usize,
    /// Byte length of `text`
    pub length: usize,
    pub score: Option<f32>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Chunk {
    /// Create a chunk, deriving `length` from the text
    pub fn new(id: impl Into<String>, document_id: impl Into<String>, text: impl Into<String>, offset: usize) -> Self {
        let text = text.into();
        let length = text.len();
        Self {
            id: id.into(),
            document_id: document_id.into(),
            text,
            offset,
            length,
            score: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style score assignment
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Builder-style metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Validate mandatory fields and the length invariant
    ///
    /// Missing `id` or `document_id` is the caller's fault and maps to
    /// [`Error::Query`]. A stale `length` is repaired rather than rejected
    /// since it is derivable.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Query("chunk is missing mandatory field `id`".to_string()));
        }
        if self.document_id.trim().is_empty() {
            return Err(Error::Query(format!(
                "chunk {:?} is missing mandatory field `document_id`",
                self.id
            )));
        }
        Ok(())
    }

    /// Half-open byte span `[offset, offset + length)` within the document
    pub fn span(&self) -> (usize, usize) {
        (self.offset, self.offset + self.length)
    }

    /// Whitespace-normalized text: trimmed, internal runs collapsed to one space
    ///
    /// This is the canonical form used for content hashing, so chunks that
    /// differ only in whitespace collapse to one during dedup.
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }

    /// md5 digest of the normalized text, hex encoded
    ///
    /// Used as the dedup key in the context pipeline and as the upsert key
    /// by vector writers, so two writers inserting identical content
    /// converge on one stored record.
    pub fn content_hash(&self) -> String {
        format!("{:x}", md5::compute(self.normalized_text().as_bytes()))
    }
}

/// Collapse whitespace runs and trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A source document grouping chunks that share `document_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source_uri: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, source_uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_uri: source_uri.into(),
            metadata: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_length_from_text() {
        let chunk = Chunk::new("c1", "doc1", "hello world", 0);
        assert_eq!(chunk.length, 11);
        assert_eq!(chunk.span(), (0, 11));
    }

    #[test]
    fn content_hash_ignores_whitespace_differences() {
        let a = Chunk::new("a", "doc1", "hello   world", 0);
        let b = Chunk::new("b", "doc1", "  hello world\n", 40);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn content_hash_distinguishes_different_text() {
        let a = Chunk::new("a", "doc1", "hello world", 0);
        let b = Chunk::new("b", "doc1", "goodbye world", 0);
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn validate_rejects_missing_mandatory_fields() {
        let chunk = Chunk::new("", "doc1", "text", 0);
        assert!(matches!(chunk.validate(), Err(Error::Query(_))));

        let chunk = Chunk::new("c1", " ", "text", 0);
        assert!(matches!(chunk.validate(), Err(Error::Query(_))));

        let chunk = Chunk::new("c1", "doc1", "text", 0);
        assert!(chunk.validate().is_ok());
    }
}
