//! Core traits and types for Cairn.
//!
//! The canonical data model, the shared error taxonomy, and the
//! capability-facing provider traits that make concrete providers
//! swappable at configuration time.

pub mod answer;
pub mod chunk;
pub mod config;
pub mod context;
pub mod error;
pub mod plugin;

pub use answer::{Answer, Constraints, Provenance, Query};
pub use chunk::{Chunk, Document};
pub use config::{CairnConfig, PackConfig, RerankConfig, RetrieverConfig, RgsConfig};
pub use context::{ContextGroup, PackedContext, PackedEntry};
pub use error::{Error, Result};
pub use plugin::{
    ChatPlugin, Embedder, Engine, GenerationOptions, RerankPlugin, RetrievalPlugin, RunOptions,
    UpsertStats, VectorWriter,
};
