//! Slot-based prompt assembly
//!
//! Three slots, always in the same order: a fixed instruction, one
//! enumerated slot per packed source, and the query. Labels in the prompt
//! are exactly the labels carried by the packed entries, so the citation
//! parser can back-map markers without guessing.

use cairn_core::PackedContext;

const CITED_INSTRUCTION: &str = "Answer the question using only the sources below. \
Cite every claim with the marker of the source it came from, e.g. [S1]. \
If the sources do not contain the answer, say you don't know.";

const UNCITED_INSTRUCTION: &str = "Answer the question using only the context below. \
If the context does not contain the answer, say you don't know.";

/// Assembles generation prompts from a packed context
#[derive(Debug, Clone, Default)]
pub struct PromptTemplate {
    instruction: Option<String>,
}

impl PromptTemplate {
    /// Override the fixed instruction slot
    pub fn with_instruction(instruction: impl Into<String>) -> Self {
        Self {
            instruction: Some(instruction.into()),
        }
    }

    /// Render the full prompt.
    ///
    /// With `enable_citations` the source slots carry their `[S<n>]` labels
    /// and the instruction demands markers; without it the sources are
    /// plain numbered context and no marker syntax is introduced.
    pub fn render(&self, packed: &PackedContext, query_text: &str, enable_citations: bool) -> String {
        let instruction = self.instruction.as_deref().unwrap_or(if enable_citations {
            CITED_INSTRUCTION
        } else {
            UNCITED_INSTRUCTION
        });

        let mut prompt = String::with_capacity(packed.total_size + query_text.len() + 256);
        prompt.push_str(instruction);
        prompt.push_str("\n\nSOURCES:\n");

        for (i, entry) in packed.entries.iter().enumerate() {
            if enable_citations {
                prompt.push_str(&format!("[{}] {}\n", entry.label, entry.text));
            } else {
                prompt.push_str(&format!("{}. {}\n", i + 1, entry.text));
            }
        }

        prompt.push_str("\nQUESTION:\n");
        prompt.push_str(query_text);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::PackedEntry;

    fn packed() -> PackedContext {
        PackedContext {
            entries: vec![
                PackedEntry {
                    label: "S1".to_string(),
                    text: "alpha facts".to_string(),
                    source_id: "c1".to_string(),
                    document_id: "doc1".to_string(),
                },
                PackedEntry {
                    label: "S2".to_string(),
                    text: "beta facts".to_string(),
                    source_id: "c2".to_string(),
                    document_id: "doc2".to_string(),
                },
            ],
            total_size: 21,
        }
    }

    #[test]
    fn cited_prompt_carries_labels_and_query() {
        let prompt = PromptTemplate::default().render(&packed(), "what is alpha?", true);
        assert!(prompt.contains("[S1] alpha facts"));
        assert!(prompt.contains("[S2] beta facts"));
        assert!(prompt.ends_with("QUESTION:\nwhat is alpha?"));
    }

    #[test]
    fn uncited_prompt_has_no_marker_syntax() {
        let prompt = PromptTemplate::default().render(&packed(), "what is alpha?", false);
        assert!(!prompt.contains("[S1]"));
        assert!(prompt.contains("1. alpha facts"));
    }

    #[test]
    fn custom_instruction_replaces_the_fixed_slot() {
        let template = PromptTemplate::with_instruction("Respond in French.");
        let prompt = template.render(&packed(), "q", true);
        assert!(prompt.starts_with("Respond in French."));
    }

    #[test]
    fn prompt_snapshot() {
        insta::assert_snapshot!(
            PromptTemplate::default().render(&packed(), "what is alpha?", true),
            @r#"
        Answer the question using only the sources below. Cite every claim with the marker of the source it came from, e.g. [S1]. If the sources do not contain the answer, say you don't know.

        SOURCES:
        [S1] alpha facts
        [S2] beta facts

        QUESTION:
        what is alpha?
        "#
        );
    }
}
