//! Cairn runtime: registries, retrieval façade, and the classic RAG engine
//!
//! Providers are resolved by `(capability kind, name)` from an explicit
//! [`PluginRegistry`]; no global state, no reflective discovery. The
//! [`EngineRegistry`] dispatches whole query-to-answer paradigms and
//! [`Runtime`] is the entry point callers use.

pub mod classic;
pub mod plugins;
pub mod registry;
pub mod retriever;
pub mod runtime;

pub use classic::ClassicEngine;
pub use registry::{PluginFactory, PluginKind, PluginRegistry};
pub use retriever::Retriever;
pub use runtime::{EngineRegistry, Runtime};
