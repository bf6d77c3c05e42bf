//! Prompt-to-provenance flow through the synthesizer

use std::sync::Mutex;

use async_trait::async_trait;
use cairn_core::{
    ChatPlugin, GenerationOptions, PackedContext, PackedEntry, Query, Result, RgsConfig,
    RunOptions,
};
use cairn_rgs::{PromptTemplate, Synthesizer};

/// Chat double that records the prompt it was handed
#[derive(Debug)]
struct RecordingChat {
    prompt: Mutex<String>,
    response: String,
}

impl RecordingChat {
    fn new(response: &str) -> Self {
        Self {
            prompt: Mutex::new(String::new()),
            response: response.to_string(),
        }
    }
}

#[async_trait]
impl ChatPlugin for RecordingChat {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        if let Ok(mut recorded) = self.prompt.lock() {
            *recorded = prompt.to_string();
        }
        Ok(self.response.clone())
    }
}

fn packed() -> PackedContext {
    let entries = vec![
        PackedEntry {
            label: "S1".to_string(),
            text: "the first source".to_string(),
            source_id: "c1".to_string(),
            document_id: "doc1".to_string(),
        },
        PackedEntry {
            label: "S2".to_string(),
            text: "the second source".to_string(),
            source_id: "c2".to_string(),
            document_id: "doc2".to_string(),
        },
    ];
    let total_size = entries.iter().map(|e| e.text.len()).sum();
    PackedContext { entries, total_size }
}

#[tokio::test]
async fn provenance_follows_citation_order_not_pack_order() {
    let synth = Synthesizer::new(RgsConfig::default());
    let chat = RecordingChat::new("Second thing [S2], then the first [S1].");

    let answer = synth
        .synthesize(
            &Query::new("which order?"),
            &packed(),
            &chat,
            &GenerationOptions::default(),
            &RunOptions::default(),
        )
        .await
        .unwrap();

    let cited: Vec<&str> = answer.provenance.iter().map(|p| p.source_id.as_str()).collect();
    assert_eq!(cited, vec!["c2", "c1"]);
}

#[tokio::test]
async fn prompt_carries_labeled_sources_and_the_question() {
    let synth = Synthesizer::new(RgsConfig::default());
    let chat = RecordingChat::new("Answer [S1].");

    synth
        .synthesize(
            &Query::new("what is in the sources?"),
            &packed(),
            &chat,
            &GenerationOptions::default(),
            &RunOptions::default(),
        )
        .await
        .unwrap();

    let prompt = chat.prompt.lock().unwrap().clone();
    assert!(prompt.contains("[S1] the first source"));
    assert!(prompt.contains("[S2] the second source"));
    assert!(prompt.contains("what is in the sources?"));
}

#[tokio::test]
async fn custom_instruction_reaches_the_generation_plugin() {
    let template = PromptTemplate::with_instruction("Answer in one sentence.");
    let synth = Synthesizer::new(RgsConfig::default()).with_template(template);
    let chat = RecordingChat::new("One sentence [S1].");

    synth
        .synthesize(
            &Query::new("q"),
            &packed(),
            &chat,
            &GenerationOptions::default(),
            &RunOptions::default(),
        )
        .await
        .unwrap();

    let prompt = chat.prompt.lock().unwrap().clone();
    assert!(prompt.starts_with("Answer in one sentence."));
}
