//! Configuration surface consumed by the orchestration layer
//!
//! Format-agnostic serde structs; a YAML loader is provided for the common
//! case. Every section has defaults so a partial file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Retrieval section: which plugin, how many candidates, which collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    pub plugin_name: String,
    pub top_k: usize,
    pub collection: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            plugin_name: "memory".to_string(),
            top_k: 20,
            collection: "default".to_string(),
        }
    }
}

/// Optional rerank pass over retrieval results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub enabled: bool,
    pub plugin_name: String,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            plugin_name: "identity".to_string(),
        }
    }
}

/// Retrieval-guided synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RgsConfig {
    /// Upper bound on context groups offered to packing
    pub max_chunks: usize,
    /// When false, the prompt carries no per-source labels and provenance
    /// covers every packed entry
    pub enable_citations: bool,
    /// When true, a generated answer with zero citation markers is an error
    pub strict_grounding: bool,
    /// Generation plugin resolved from the registry
    pub plugin_name: String,
}

impl Default for RgsConfig {
    fn default() -> Self {
        Self {
            max_chunks: 5,
            enable_citations: true,
            strict_grounding: false,
            plugin_name: "static".to_string(),
        }
    }
}

/// Context window packing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Maximum aggregate context size in bytes of UTF-8 text
    pub budget: usize,
    /// Maximum byte gap between spans that the merge stage still coalesces
    pub tolerance: usize,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            budget: 6000,
            tolerance: 0,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    pub retriever: RetrieverConfig,
    pub rerank: RerankConfig,
    pub rgs: RgsConfig,
    pub pack: PackConfig,
}

impl CairnConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Configuration(format!("invalid config: {e}")))
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Configuration(format!("cannot read config {}: {e}", path.as_ref().display()))
        })?;
        Self::from_yaml(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sane() {
        let config = CairnConfig::default();
        assert_eq!(config.retriever.top_k, 20);
        assert!(!config.rerank.enabled);
        assert_eq!(config.rgs.max_chunks, 5);
        assert!(config.rgs.enable_citations);
        assert!(!config.rgs.strict_grounding);
        assert_eq!(config.pack.budget, 6000);
        assert_eq!(config.pack.tolerance, 0);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = CairnConfig::from_yaml(
            "retriever:\n  plugin_name: qdrant\n  top_k: 8\npack:\n  budget: 2000\n",
        )
        .unwrap();
        assert_eq!(config.retriever.plugin_name, "qdrant");
        assert_eq!(config.retriever.top_k, 8);
        assert_eq!(config.pack.budget, 2000);
        // untouched sections keep defaults
        assert_eq!(config.rgs.max_chunks, 5);
    }

    #[test]
    fn invalid_yaml_is_a_configuration_error() {
        let err = CairnConfig::from_yaml("retriever: [not, a, map]").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cairn.yaml");
        std::fs::write(&path, "rgs:\n  strict_grounding: true\n").unwrap();

        let config = CairnConfig::from_yaml_file(&path).unwrap();
        assert!(config.rgs.strict_grounding);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = CairnConfig::from_yaml_file("/nonexistent/cairn.yaml").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
