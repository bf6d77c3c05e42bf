//! Classic RAG engine
//!
//! Retrieval, context processing, then retrieval-guided synthesis, all
//! behind the paradigm-agnostic [`cairn_core::Engine`] contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use cairn_core::{
    Answer, CairnConfig, ChatPlugin, Engine, GenerationOptions, Query, Result, RunOptions,
};
use cairn_context::ContextPipeline;
use cairn_rgs::Synthesizer;

use crate::registry::PluginRegistry;
use crate::retriever::Retriever;

/// The retrieve-then-synthesize engine
pub struct ClassicEngine {
    retriever: Retriever,
    pipeline: ContextPipeline,
    synthesizer: Synthesizer,
    chat: Arc<dyn ChatPlugin>,
    max_chunks: usize,
}

impl std::fmt::Debug for ClassicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassicEngine")
            .field("max_chunks", &self.max_chunks)
            .finish_non_exhaustive()
    }
}

impl ClassicEngine {
    /// Resolve all collaborators from the registry per the configuration.
    ///
    /// Fails with a configuration error when any named plugin is unknown.
    pub fn from_config(config: &CairnConfig, plugins: &PluginRegistry) -> Result<Self> {
        let params = json!({ "collection": config.retriever.collection });
        let retrieval = plugins.resolve_retrieval(&config.retriever.plugin_name, &params)?;

        let mut retriever = Retriever::new(retrieval, &config.retriever);
        if config.rerank.enabled {
            let rerank = plugins.resolve_rerank(&config.rerank.plugin_name, &serde_json::Value::Null)?;
            retriever = retriever.with_rerank(rerank);
        }

        let chat = plugins.resolve_chat(&config.rgs.plugin_name, &serde_json::Value::Null)?;

        Ok(Self {
            retriever,
            pipeline: ContextPipeline::new(config.pack.clone()),
            synthesizer: Synthesizer::new(config.rgs.clone()),
            chat,
            max_chunks: config.rgs.max_chunks,
        })
    }

    /// Effective source cap: the tighter of config and query constraints
    fn effective_max_sources(&self, query: &Query) -> usize {
        query
            .constraints
            .as_ref()
            .and_then(|c| c.max_sources)
            .map_or(self.max_chunks, |m| m.min(self.max_chunks))
    }
}

#[async_trait]
impl Engine for ClassicEngine {
    async fn answer(&self, query: &Query, run: &RunOptions) -> Result<Answer> {
        query.validate()?;

        let chunks = self
            .retriever
            .retrieve(&query.text, query.constraints.as_ref(), run)
            .await?;

        let max_sources = Some(self.effective_max_sources(query));
        let (packed, metrics) = self.pipeline.process(chunks, max_sources, run)?;

        let mut answer = self
            .synthesizer
            .synthesize(query, &packed, self.chat.as_ref(), &GenerationOptions::default(), run)
            .await?;

        if let serde_json::Value::Object(map) = &mut answer.metadata {
            map.insert("pipeline_metrics".to_string(), json!(metrics));
            map.insert("engine".to_string(), json!("classic"));
        }
        Ok(answer)
    }
}
