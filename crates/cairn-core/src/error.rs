//! Error taxonomy shared across the Cairn workspace
//!
//! Four categories, matching who is at fault and who may retry:
//! - [`Error::Query`]: malformed caller input; never retried.
//! - [`Error::Knowledge`]: retrieval or vector-store failure.
//! - [`Error::Generation`]: generation provider failure or a
//!   strict-grounding violation.
//! - [`Error::Configuration`]: unknown plugin or engine name, or invalid config.
//!
//! Retry and backoff are provider-plugin policy; the orchestration layer
//! surfaces every error to the caller unmodified.

use thiserror::Error;

/// Errors raised by the Cairn core and its façades
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or empty query, or structurally invalid chunk input
    #[error("query error: {0}")]
    Query(String),

    /// Retrieval or vector-store failure
    #[error("knowledge error: {0}")]
    Knowledge(String),

    /// Generation provider failure or strict-grounding violation
    #[error("generation error: {0}")]
    Generation(String),

    /// Unknown plugin/engine name or invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Short category tag, useful in logs and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Query(_) => "query",
            Error::Knowledge(_) => "knowledge",
            Error::Generation(_) => "generation",
            Error::Configuration(_) => "configuration",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
