//! Capability-facing provider traits
//!
//! Every concrete provider (retrieval, rerank, generation, vector storage,
//! embedding) plugs in through one of these traits. The orchestration layer
//! holds providers as `Arc<dyn Trait>` and never downcasts; provider-specific
//! validation belongs to the provider itself.
//!
//! Retry and backoff are provider policy. The core makes exactly one call
//! per boundary and surfaces failures unmodified.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;

use crate::{Answer, Chunk, Query, Result};

/// Options forwarded to the generation provider
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Per-run options carried alongside a query
///
/// The deadline is cooperative: it is checked before each pipeline stage and
/// before each external call, never mid-stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub deadline: Option<Instant>,
}

impl RunOptions {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// True once the deadline has passed
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Outcome of a vector-writer upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    /// Chunks skipped because a record with the same content hash existed
    pub deduplicated: usize,
}

/// Retrieval capability: query text in, scored chunks out
#[async_trait]
pub trait RetrievalPlugin: Send + Sync {
    async fn retrieve(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Chunk>>;
}

/// Rerank capability: same chunks, reordered and rescored
#[async_trait]
pub trait RerankPlugin: Send + Sync {
    async fn rerank(&self, query_text: &str, chunks: Vec<Chunk>) -> Result<Vec<Chunk>>;
}

/// Generation capability
#[async_trait]
pub trait ChatPlugin: std::fmt::Debug + Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

/// Embedding capability, consumed by dense vector-store plugins
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Ingestion-side vector-store writer
///
/// Upserts are keyed by content hash with at-least-once semantics: two
/// writers inserting the same content must converge to one stored record.
#[async_trait]
pub trait VectorWriter: Send + Sync {
    async fn upsert(&self, chunks: Vec<Chunk>) -> Result<UpsertStats>;
}

/// A complete query-to-answer paradigm implementation
///
/// This is the one seam the engine registry dispatches on; it holds no
/// knowledge of what is inside an engine. The caller's cooperative deadline
/// rides in `run` and is honored at each external-call boundary.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn answer(&self, query: &Query, run: &RunOptions) -> Result<Answer>;
}
