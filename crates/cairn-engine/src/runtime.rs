//! Engine registry and universal runtime
//!
//! Engines are whole query-to-answer paradigms registered by name; the
//! runtime resolves one, runs it, and hands back the answer. It holds no
//! knowledge of what is inside an engine: classic pipeline, an alternative
//! reasoning paradigm, or a user-supplied implementation all look the same
//! through [`cairn_core::Engine`].

use std::collections::HashMap;
use std::sync::Arc;

use cairn_core::{Answer, CairnConfig, Constraints, Engine, Error, Query, Result, RunOptions};

use crate::classic::ClassicEngine;
use crate::registry::PluginRegistry;

type EngineFactory = Arc<dyn Fn(&CairnConfig, &PluginRegistry) -> Result<Arc<dyn Engine>> + Send + Sync>;

/// Catalogue of engine paradigms
#[derive(Default)]
pub struct EngineRegistry {
    entries: Vec<(String, String, EngineFactory)>,
    index: HashMap<String, usize>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine factory; duplicate names are a configuration error
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: EngineFactory,
    ) -> Result<()> {
        self.register_with(name, description, factory, false)
    }

    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: EngineFactory,
        replace: bool,
    ) -> Result<()> {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            if !replace {
                return Err(Error::Configuration(format!(
                    "engine {name:?} is already registered"
                )));
            }
            self.entries[i].1 = description.into();
            self.entries[i].2 = factory;
            return Ok(());
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, description.into(), factory));
        Ok(())
    }

    /// Instantiate a registered engine
    pub fn create_engine(
        &self,
        name: &str,
        config: &CairnConfig,
        plugins: &PluginRegistry,
    ) -> Result<Arc<dyn Engine>> {
        let &i = self.index.get(name).ok_or_else(|| {
            let available: Vec<_> = self.entries.iter().map(|(n, _, _)| n.as_str()).collect();
            Error::Configuration(format!("unknown engine {name:?}, available: {available:?}"))
        })?;
        (self.entries[i].2)(config, plugins)
    }

    /// `(name, description)` pairs in registration order
    pub fn list(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(n, d, _)| (n.clone(), d.clone()))
            .collect()
    }
}

/// Uniform entry point: pick an engine by name, answer the query
pub struct Runtime {
    config: CairnConfig,
    plugins: Arc<PluginRegistry>,
    engines: EngineRegistry,
}

impl Runtime {
    /// Runtime with builtin plugins and the classic engine installed
    pub fn new(config: CairnConfig) -> Self {
        Self::with_plugins(config, PluginRegistry::with_builtins())
    }

    /// Runtime over a caller-populated plugin registry
    pub fn with_plugins(config: CairnConfig, plugins: PluginRegistry) -> Self {
        let mut engines = EngineRegistry::new();
        engines
            .register(
                "classic",
                "Classic RAG: retrieve, pack context, synthesize with citations",
                Arc::new(|config, plugins| {
                    Ok(Arc::new(ClassicEngine::from_config(config, plugins)?) as Arc<dyn Engine>)
                }),
            )
            .expect("fresh registry cannot hold a duplicate");

        Self {
            config,
            plugins: Arc::new(plugins),
            engines,
        }
    }

    /// Register an additional engine paradigm
    pub fn register_engine(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: EngineFactory,
    ) -> Result<()> {
        self.engines.register(name, description, factory)
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    /// Answer `query_text` with the named engine
    pub async fn run(
        &self,
        query_text: &str,
        engine: &str,
        constraints: Option<Constraints>,
    ) -> Result<Answer> {
        self.run_with_options(query_text, engine, constraints, RunOptions::default())
            .await
    }

    /// Like [`run`](Self::run) with an explicit deadline/options
    pub async fn run_with_options(
        &self,
        query_text: &str,
        engine: &str,
        constraints: Option<Constraints>,
        run: RunOptions,
    ) -> Result<Answer> {
        if query_text.trim().is_empty() {
            return Err(Error::Query("query text cannot be empty".to_string()));
        }

        let mut query = Query::new(query_text);
        query.constraints = constraints;

        let engine = self.engines.create_engine(engine, &self.config, &self.plugins)?;
        tracing::info!(query = query_text, "dispatching query");
        engine.answer(&query, &run).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Minimal alternative paradigm: answers from nothing but the query
    struct EchoEngine;

    #[async_trait]
    impl Engine for EchoEngine {
        async fn answer(&self, query: &Query, _run: &RunOptions) -> Result<Answer> {
            Ok(Answer::new(format!("echo: {}", query.text)))
        }
    }

    #[test]
    fn duplicate_engine_names_are_rejected() {
        let mut registry = EngineRegistry::new();
        let factory: EngineFactory = Arc::new(|_, _| Ok(Arc::new(EchoEngine) as Arc<dyn Engine>));
        registry.register("echo", "", factory.clone()).unwrap();
        let err = registry.register("echo", "", factory).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn create_engine_uses_the_registered_factory() {
        let mut registry = EngineRegistry::new();
        registry
            .register("echo", "echoes", Arc::new(|_, _| Ok(Arc::new(EchoEngine) as Arc<dyn Engine>)))
            .unwrap();
        let engine = registry.create_engine("echo", &CairnConfig::default(), &PluginRegistry::new());
        assert!(engine.is_ok());
    }

    #[tokio::test]
    async fn unknown_engine_is_a_configuration_error() {
        let runtime = Runtime::new(CairnConfig::default());
        let err = runtime.run("hello", "no-such-engine", None).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_dispatch() {
        let runtime = Runtime::new(CairnConfig::default());
        let err = runtime.run("   ", "classic", None).await.unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[tokio::test]
    async fn user_supplied_engine_dispatches_like_builtin() {
        let mut runtime = Runtime::new(CairnConfig::default());
        runtime
            .register_engine("echo", "echoes the query", Arc::new(|_, _| {
                Ok(Arc::new(EchoEngine) as Arc<dyn Engine>)
            }))
            .unwrap();
        let answer = runtime.run("ping", "echo", None).await.unwrap();
        assert_eq!(answer.text, "echo: ping");
    }
}
