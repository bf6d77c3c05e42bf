//! In-memory reference plugins
//!
//! [`MemoryVectorStore`] backs tests, demos, and offline runs with
//! lexical-overlap scoring instead of real embeddings. [`StaticChatPlugin`]
//! is the matching generation double.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use cairn_core::{
    ChatPlugin, Chunk, Error, GenerationOptions, RerankPlugin, Result, RetrievalPlugin,
    UpsertStats, VectorWriter,
};

/// In-memory vector store: retrieval plugin and vector writer in one
///
/// Cloning shares the underlying storage, so a seeded store can be handed
/// to a registry factory closure and to the test that seeded it.
#[derive(Clone, Default)]
pub struct MemoryVectorStore {
    inner: Arc<RwLock<Store>>,
}

#[derive(Default)]
struct Store {
    /// chunks keyed by content hash; insertion order kept for deterministic ties
    by_hash: HashMap<String, Chunk>,
    order: Vec<String>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Word-overlap fraction of query terms found in the chunk text
    fn lexical_score(query: &str, text: &str) -> f32 {
        let text_lower = text.to_lowercase();
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        if terms.is_empty() {
            return 0.0;
        }
        let hits = terms.iter().filter(|t| text_lower.contains(**t)).count();
        hits as f32 / terms.len() as f32
    }

    fn matches_filters(chunk: &Chunk, filters: &BTreeMap<String, String>) -> bool {
        filters.iter().all(|(key, expected)| {
            chunk
                .metadata
                .get(key)
                .and_then(|v| v.as_str())
                .is_some_and(|v| v == expected)
        })
    }
}

#[async_trait]
impl VectorWriter for MemoryVectorStore {
    async fn upsert(&self, chunks: Vec<Chunk>) -> Result<UpsertStats> {
        let mut store = self
            .inner
            .write()
            .map_err(|e| Error::Knowledge(format!("memory store lock poisoned: {e}")))?;

        let mut stats = UpsertStats::default();
        for chunk in chunks {
            let hash = chunk.content_hash();
            if store.by_hash.contains_key(&hash) {
                // same content already stored; converge instead of duplicating
                stats.deduplicated += 1;
                continue;
            }
            store.order.push(hash.clone());
            store.by_hash.insert(hash, chunk);
            stats.inserted += 1;
        }
        Ok(stats)
    }
}

#[async_trait]
impl RetrievalPlugin for MemoryVectorStore {
    async fn retrieve(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Chunk>> {
        let store = self
            .inner
            .read()
            .map_err(|e| Error::Knowledge(format!("memory store lock poisoned: {e}")))?;

        let mut scored: Vec<Chunk> = store
            .order
            .iter()
            .filter_map(|hash| store.by_hash.get(hash))
            .filter(|chunk| Self::matches_filters(chunk, filters))
            .filter_map(|chunk| {
                let score = Self::lexical_score(query_text, &chunk.text);
                (score > 0.0).then(|| chunk.clone().with_score(score))
            })
            .collect();

        // stable sort keeps insertion order on score ties
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Reranker that returns its input unchanged
pub struct IdentityRerank;

#[async_trait]
impl RerankPlugin for IdentityRerank {
    async fn rerank(&self, _query_text: &str, chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        Ok(chunks)
    }
}

/// Offline generation double
///
/// Without an override it answers with one sentence per source slot found
/// in the prompt, citing that slot's marker, so strict grounding holds.
#[derive(Debug, Default, Clone)]
pub struct StaticChatPlugin {
    response: Option<String>,
}

impl StaticChatPlugin {
    /// Always return exactly this text
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Labels of the source slots in the prompt, in order of appearance
    fn prompt_labels(prompt: &str) -> Vec<String> {
        prompt
            .lines()
            .filter_map(|line| {
                let rest = line.strip_prefix("[S")?;
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                let after = &rest[digits.len()..];
                (!digits.is_empty() && after.starts_with(']')).then(|| format!("S{digits}"))
            })
            .collect()
    }
}

#[async_trait]
impl ChatPlugin for StaticChatPlugin {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        if let Some(response) = &self.response {
            return Ok(response.clone());
        }

        let labels = Self::prompt_labels(prompt);
        if labels.is_empty() {
            return Ok("The provided context does not contain citation slots; \
                       summarizing it as given."
                .to_string());
        }

        let mut answer = String::from("Summary of the provided sources:");
        for label in labels {
            answer.push_str(&format!(" see [{label}]."));
        }
        Ok(answer)
    }
}
