//! Plugin registry
//!
//! Maps a `(capability kind, name)` pair to a factory. Registration rejects
//! collisions unless `replace` is requested; resolution defers all
//! provider-specific validation to the factory. The registry is an explicit
//! process-scoped object: populate it once at startup (registration takes
//! `&mut self`), then share it behind an `Arc` for read-mostly concurrent
//! resolution.

use std::collections::HashMap;
use std::sync::Arc;

use cairn_core::{ChatPlugin, Error, RerankPlugin, Result, RetrievalPlugin, VectorWriter};

use crate::plugins;

/// Capability a plugin provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Retrieval,
    Rerank,
    Chat,
    VectorWriter,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PluginKind::Retrieval => "retrieval",
            PluginKind::Rerank => "rerank",
            PluginKind::Chat => "chat",
            PluginKind::VectorWriter => "vector_writer",
        };
        write!(f, "{name}")
    }
}

type FactoryFn<T> = Arc<dyn Fn(&serde_json::Value) -> Result<Arc<T>> + Send + Sync>;

/// Capability-typed constructor stored by the registry
///
/// The enum makes the capability check happen at registration time: a
/// factory registered under one kind can never be resolved as another.
#[derive(Clone)]
pub enum PluginFactory {
    Retrieval(FactoryFn<dyn RetrievalPlugin>),
    Rerank(FactoryFn<dyn RerankPlugin>),
    Chat(FactoryFn<dyn ChatPlugin>),
    VectorWriter(FactoryFn<dyn VectorWriter>),
}

impl PluginFactory {
    fn kind(&self) -> PluginKind {
        match self {
            PluginFactory::Retrieval(_) => PluginKind::Retrieval,
            PluginFactory::Rerank(_) => PluginKind::Rerank,
            PluginFactory::Chat(_) => PluginKind::Chat,
            PluginFactory::VectorWriter(_) => PluginKind::VectorWriter,
        }
    }
}

struct Registration {
    kind: PluginKind,
    name: String,
    description: String,
    factory: PluginFactory,
}

/// Process-scoped catalogue of provider factories
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<Registration>,
    index: HashMap<(PluginKind, String), usize>,
    diagnostics: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every builtin plugin installed
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.install_builtins();
        registry
    }

    /// Register a factory under `(kind, name)`.
    ///
    /// The kind is taken from the factory itself, so a capability mismatch
    /// cannot be expressed. Duplicate names fail with a configuration error;
    /// no silent override.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: PluginFactory,
    ) -> Result<()> {
        self.register_with(name, description, factory, false)
    }

    /// Like [`register`](Self::register) but with an explicit replace flag
    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: PluginFactory,
        replace: bool,
    ) -> Result<()> {
        let name = name.into();
        let kind = factory.kind();
        let key = (kind, name.clone());

        if let Some(&i) = self.index.get(&key) {
            if !replace {
                return Err(Error::Configuration(format!(
                    "{kind} plugin {name:?} is already registered"
                )));
            }
            self.entries[i].description = description.into();
            self.entries[i].factory = factory;
            return Ok(());
        }

        self.index.insert(key, self.entries.len());
        self.entries.push(Registration {
            kind,
            name: name.clone(),
            description: description.into(),
            factory,
        });
        tracing::debug!(%kind, name, "registered plugin");
        Ok(())
    }

    /// Resolve a retrieval plugin by name
    pub fn resolve_retrieval(&self, name: &str, params: &serde_json::Value) -> Result<Arc<dyn RetrievalPlugin>> {
        match self.lookup(PluginKind::Retrieval, name)? {
            PluginFactory::Retrieval(f) => f(params),
            _ => unreachable!("index is keyed by kind"),
        }
    }

    /// Resolve a rerank plugin by name
    pub fn resolve_rerank(&self, name: &str, params: &serde_json::Value) -> Result<Arc<dyn RerankPlugin>> {
        match self.lookup(PluginKind::Rerank, name)? {
            PluginFactory::Rerank(f) => f(params),
            _ => unreachable!("index is keyed by kind"),
        }
    }

    /// Resolve a chat/generation plugin by name
    pub fn resolve_chat(&self, name: &str, params: &serde_json::Value) -> Result<Arc<dyn ChatPlugin>> {
        match self.lookup(PluginKind::Chat, name)? {
            PluginFactory::Chat(f) => f(params),
            _ => unreachable!("index is keyed by kind"),
        }
    }

    /// Resolve a vector writer by name
    pub fn resolve_vector_writer(&self, name: &str, params: &serde_json::Value) -> Result<Arc<dyn VectorWriter>> {
        match self.lookup(PluginKind::VectorWriter, name)? {
            PluginFactory::VectorWriter(f) => f(params),
            _ => unreachable!("index is keyed by kind"),
        }
    }

    /// `(name, description)` pairs for one capability, in registration order
    pub fn list(&self, kind: PluginKind) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| (r.name.clone(), r.description.clone()))
            .collect()
    }

    /// Failures collected while installing the builtin manifest
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Install the static builtin manifest.
    ///
    /// One entry failing to register must not abort the rest: each failure
    /// is recorded in [`diagnostics`](Self::diagnostics) instead of raised.
    pub fn install_builtins(&mut self) {
        for (name, description, factory) in plugins::builtin_manifest() {
            if let Err(e) = self.register(name, description, factory) {
                tracing::warn!(error = %e, "builtin plugin registration failed");
                self.diagnostics.push(e.to_string());
            }
        }
    }

    fn lookup(&self, kind: PluginKind, name: &str) -> Result<&PluginFactory> {
        self.index
            .get(&(kind, name.to_string()))
            .map(|&i| &self.entries[i].factory)
            .ok_or_else(|| {
                let available: Vec<_> = self.list(kind).into_iter().map(|(n, _)| n).collect();
                Error::Configuration(format!(
                    "unknown {kind} plugin {name:?}, available: {available:?}"
                ))
            })
    }
}
