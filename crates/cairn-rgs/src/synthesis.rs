//! Grounded answer synthesis
//!
//! One generation call per query. Retry policy belongs to the generation
//! plugin; the synthesizer surfaces provider failures unmodified. Citation
//! correctness is enforced on the provenance list, never by mutating model
//! output: hallucinated markers are dropped from provenance while the
//! answer text is returned as generated.

use std::collections::BTreeMap;

use serde_json::json;

use cairn_core::{
    Answer, ChatPlugin, Error, GenerationOptions, PackedContext, PackedEntry, Provenance, Query,
    Result, RgsConfig, RunOptions,
};

use crate::citations::parse_citations;
use crate::prompt::PromptTemplate;

/// Retrieval-guided synthesis stage
pub struct Synthesizer {
    config: RgsConfig,
    template: PromptTemplate,
}

impl Synthesizer {
    pub fn new(config: RgsConfig) -> Self {
        Self {
            config,
            template: PromptTemplate::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Produce a grounded answer from the packed context.
    ///
    /// Fails with a generation error when the provider fails, or when strict
    /// grounding is on and the generated text carries no recognizable
    /// citation marker at all.
    pub async fn synthesize(
        &self,
        query: &Query,
        packed: &PackedContext,
        chat: &dyn ChatPlugin,
        options: &GenerationOptions,
        run: &RunOptions,
    ) -> Result<Answer> {
        if run.expired() {
            return Err(Error::Query("deadline exceeded before generation call".to_string()));
        }

        let citations_on = self.config.enable_citations;
        let prompt = self.template.render(packed, &query.text, citations_on);
        let generated = chat.generate(&prompt, options).await?;

        let provenance = if citations_on {
            self.cited_provenance(&generated, packed)?
        } else {
            // no markers to verify; attribute every packed entry
            packed.entries.iter().map(entry_provenance).collect()
        };

        tracing::debug!(
            sources_offered = packed.entries.len(),
            sources_cited = provenance.len(),
            "synthesis finished"
        );

        Ok(Answer {
            text: generated,
            provenance,
            metadata: json!({
                "sources_offered": packed.entries.len(),
                "citations_enabled": citations_on,
            }),
        })
    }

    fn cited_provenance(&self, generated: &str, packed: &PackedContext) -> Result<Vec<Provenance>> {
        let labels = parse_citations(generated);

        if labels.is_empty() && self.config.strict_grounding {
            return Err(Error::Generation(
                "strict grounding: generated answer contains no citation markers".to_string(),
            ));
        }

        let mut provenance = Vec::with_capacity(labels.len());
        for label in labels {
            match packed.entry_for_label(&label) {
                Some(entry) => provenance.push(entry_provenance(entry)),
                // hallucinated label: drop from provenance, keep the text as-is
                None => tracing::debug!(label, "dropping citation of unknown source"),
            }
        }
        Ok(provenance)
    }
}

fn entry_provenance(entry: &PackedEntry) -> Provenance {
    let mut metadata = BTreeMap::new();
    metadata.insert("label".to_string(), json!(entry.label));
    metadata.insert("document_id".to_string(), json!(entry.document_id));
    Provenance {
        source_id: entry.source_id.clone(),
        excerpt: entry.text.clone(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Chat double that returns a canned response
    #[derive(Debug)]
    struct CannedChat(String);

    #[async_trait]
    impl ChatPlugin for CannedChat {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    /// Chat double that always fails
    #[derive(Debug)]
    struct FailingChat;

    #[async_trait]
    impl ChatPlugin for FailingChat {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Err(Error::Generation("provider unavailable".to_string()))
        }
    }

    fn packed() -> PackedContext {
        PackedContext {
            entries: vec![
                PackedEntry {
                    label: "S1".to_string(),
                    text: "alpha is first".to_string(),
                    source_id: "c1".to_string(),
                    document_id: "doc1".to_string(),
                },
                PackedEntry {
                    label: "S2".to_string(),
                    text: "beta is second".to_string(),
                    source_id: "c2".to_string(),
                    document_id: "doc2".to_string(),
                },
            ],
            total_size: 28,
        }
    }

    fn config(strict: bool) -> RgsConfig {
        RgsConfig {
            strict_grounding: strict,
            ..RgsConfig::default()
        }
    }

    #[tokio::test]
    async fn maps_markers_to_provenance() {
        let synth = Synthesizer::new(config(false));
        let chat = CannedChat("Alpha is first [S1], beta follows [S2].".to_string());
        let answer = synth
            .synthesize(
                &Query::new("order?"),
                &packed(),
                &chat,
                &GenerationOptions::default(),
                &RunOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(answer.provenance.len(), 2);
        assert_eq!(answer.provenance[0].source_id, "c1");
        assert_eq!(answer.provenance[1].source_id, "c2");
        assert_eq!(answer.provenance[0].excerpt, "alpha is first");
    }

    #[tokio::test]
    async fn hallucinated_markers_are_dropped_text_untouched() {
        let synth = Synthesizer::new(config(false));
        let text = "Claim [S1]. Fabricated claim [S9].";
        let chat = CannedChat(text.to_string());
        let answer = synth
            .synthesize(
                &Query::new("q"),
                &packed(),
                &chat,
                &GenerationOptions::default(),
                &RunOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(answer.text, text);
        assert_eq!(answer.provenance.len(), 1);
        assert_eq!(answer.provenance[0].source_id, "c1");
    }

    #[tokio::test]
    async fn strict_grounding_rejects_uncited_answers() {
        let synth = Synthesizer::new(config(true));
        let chat = CannedChat("An answer with no citations at all.".to_string());
        let err = synth
            .synthesize(
                &Query::new("q"),
                &packed(),
                &chat,
                &GenerationOptions::default(),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn lenient_mode_returns_uncited_answer_with_empty_provenance() {
        let synth = Synthesizer::new(config(false));
        let chat = CannedChat("An answer with no citations at all.".to_string());
        let answer = synth
            .synthesize(
                &Query::new("q"),
                &packed(),
                &chat,
                &GenerationOptions::default(),
                &RunOptions::default(),
            )
            .await
            .unwrap();
        assert!(answer.provenance.is_empty());
    }

    #[tokio::test]
    async fn citations_disabled_attributes_all_packed_entries() {
        let mut cfg = config(false);
        cfg.enable_citations = false;
        let synth = Synthesizer::new(cfg);
        let chat = CannedChat("Plain answer.".to_string());
        let answer = synth
            .synthesize(
                &Query::new("q"),
                &packed(),
                &chat,
                &GenerationOptions::default(),
                &RunOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(answer.provenance.len(), 2);
    }

    #[tokio::test]
    async fn provider_failure_propagates_unmodified() {
        let synth = Synthesizer::new(config(false));
        let err = synth
            .synthesize(
                &Query::new("q"),
                &packed(),
                &FailingChat,
                &GenerationOptions::default(),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
