//! Builtin plugins and the static registration manifest
//!
//! Discovery by namespace scanning is deliberately absent; everything the
//! registry knows out of the box is listed in [`builtin_manifest`], and
//! applications add their own providers with explicit `register` calls.

pub mod memory;

use std::sync::Arc;

use crate::registry::PluginFactory;

use memory::{IdentityRerank, MemoryVectorStore, StaticChatPlugin};

/// The static builtin manifest: `(name, description, factory)` triples
///
/// The `memory` writer and retriever share one store, so chunks upserted
/// through the resolved writer are visible to the resolved retriever.
pub fn builtin_manifest() -> Vec<(&'static str, &'static str, PluginFactory)> {
    let store = MemoryVectorStore::new();
    let retrieval = store.clone();
    vec![
        (
            "memory",
            "In-memory vector store with lexical-overlap retrieval (tests, demos)",
            PluginFactory::Retrieval(Arc::new(move |_params| Ok(Arc::new(retrieval.clone())))),
        ),
        (
            "memory",
            "In-memory content-hash deduplicating vector writer",
            PluginFactory::VectorWriter(Arc::new(move |_params| Ok(Arc::new(store.clone())))),
        ),
        (
            "identity",
            "Pass-through reranker that preserves retrieval order",
            PluginFactory::Rerank(Arc::new(|_params| Ok(Arc::new(IdentityRerank)))),
        ),
        (
            "static",
            "Offline chat double that cites every source slot in its prompt",
            PluginFactory::Chat(Arc::new(|params| {
                let mut chat = StaticChatPlugin::default();
                if let Some(response) = params.get("response").and_then(|v| v.as_str()) {
                    chat = chat.with_response(response);
                }
                Ok(Arc::new(chat))
            })),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use cairn_core::Chunk;

    use crate::registry::PluginRegistry;

    #[tokio::test]
    async fn memory_writer_and_retriever_share_storage() {
        let registry = PluginRegistry::with_builtins();

        let writer = registry
            .resolve_vector_writer("memory", &serde_json::Value::Null)
            .unwrap();
        writer
            .upsert(vec![Chunk::new("c1", "doc1", "shared storage content", 0)])
            .await
            .unwrap();

        let retrieval = registry
            .resolve_retrieval("memory", &serde_json::Value::Null)
            .unwrap();
        let results = retrieval
            .retrieve("shared storage", 10, &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "c1");
    }

    #[tokio::test]
    async fn separate_registries_do_not_share_storage() {
        let first = PluginRegistry::with_builtins();
        let writer = first
            .resolve_vector_writer("memory", &serde_json::Value::Null)
            .unwrap();
        writer
            .upsert(vec![Chunk::new("c1", "doc1", "isolated content", 0)])
            .await
            .unwrap();

        let second = PluginRegistry::with_builtins();
        let retrieval = second
            .resolve_retrieval("memory", &serde_json::Value::Null)
            .unwrap();
        let results = retrieval
            .retrieve("isolated content", 10, &BTreeMap::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
