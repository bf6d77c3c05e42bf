//! Retrieval façade
//!
//! Thin orchestration around the configured retrieval plugin: runs the
//! retrieval call, optionally reranks, and translates provider failures
//! into knowledge errors so engines see one failure domain for everything
//! knowledge-side.

use std::sync::Arc;

use cairn_core::{
    Chunk, Constraints, Error, RerankPlugin, Result, RetrievalPlugin, RetrieverConfig, RunOptions,
};

/// Invokes a retrieval plugin and an optional rerank pass
pub struct Retriever {
    plugin: Arc<dyn RetrievalPlugin>,
    rerank: Option<Arc<dyn RerankPlugin>>,
    top_k: usize,
}

impl Retriever {
    pub fn new(plugin: Arc<dyn RetrievalPlugin>, config: &RetrieverConfig) -> Self {
        Self {
            plugin,
            rerank: None,
            top_k: config.top_k,
        }
    }

    pub fn with_rerank(mut self, rerank: Arc<dyn RerankPlugin>) -> Self {
        self.rerank = Some(rerank);
        self
    }

    /// Retrieve scored chunks for a query.
    ///
    /// The caller's deadline is checked before each of the two external
    /// calls. Plugin errors other than caller-fault query errors surface as
    /// knowledge errors.
    pub async fn retrieve(
        &self,
        query_text: &str,
        constraints: Option<&Constraints>,
        run: &RunOptions,
    ) -> Result<Vec<Chunk>> {
        if run.expired() {
            return Err(Error::Query("deadline exceeded before retrieval call".to_string()));
        }

        let empty = Constraints::default();
        let filters = &constraints.unwrap_or(&empty).filters;

        let chunks = self
            .plugin
            .retrieve(query_text, self.top_k, filters)
            .await
            .map_err(|e| knowledge(e, "retrieval"))?;
        tracing::debug!(retrieved = chunks.len(), top_k = self.top_k, "retrieval finished");

        let Some(rerank) = &self.rerank else {
            return Ok(chunks);
        };

        if run.expired() {
            return Err(Error::Query("deadline exceeded before rerank call".to_string()));
        }
        let reranked = rerank
            .rerank(query_text, chunks)
            .await
            .map_err(|e| knowledge(e, "rerank"))?;
        Ok(reranked)
    }
}

/// Translate a provider failure into the knowledge domain
fn knowledge(err: Error, operation: &str) -> Error {
    match err {
        Error::Query(_) | Error::Knowledge(_) => err,
        other => Error::Knowledge(format!("{operation} plugin failed: {other}")),
    }
}
