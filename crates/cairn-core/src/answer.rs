//! Query and answer contracts
//!
//! [`Query`] is the input to any engine; [`Answer`] is the only value that
//! escapes back to the caller. `Answer.text` and `Answer.provenance` are the
//! stable fields callers may depend on indefinitely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Query-time constraints, all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Upper bound on distinct sources packed into the context
    pub max_sources: Option<usize>,
    /// Metadata filters forwarded to the retrieval plugin
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

/// Input to an engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub constraints: Option<Constraints>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            constraints: None,
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Reject empty or whitespace-only query text
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::Query("query text cannot be empty".to_string()));
        }
        if let Some(c) = &self.constraints {
            if c.max_sources == Some(0) {
                return Err(Error::Query("max_sources must be greater than zero".to_string()));
            }
        }
        Ok(())
    }
}

/// Attribution record linking an answer claim to a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// Chunk or document id that contributed to the packed context
    pub source_id: String,
    pub excerpt: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Terminal artifact of a query; immutable once returned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub provenance: Vec<Provenance>,
    pub metadata: serde_json::Value,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }
}
