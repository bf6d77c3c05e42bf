//! Retrieval-guided synthesis (RGS) for Cairn
//!
//! Assembles a slot-based prompt over the packed context, invokes the
//! generation plugin exactly once, and back-maps citation markers in the
//! generated text to [`cairn_core::Provenance`] records.

pub mod citations;
pub mod prompt;
pub mod synthesis;

pub use citations::parse_citations;
pub use prompt::PromptTemplate;
pub use synthesis::Synthesizer;
