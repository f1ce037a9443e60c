//! The orchestrator: a plugin registry plus executor settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dataforge_config::DataforgeConfig;
use dataforge_pipeline::{
    ExecutionContext, ExecutorConfig, PipelineConfig, PipelineError, PipelineExecutor,
    PipelineLoader, RunReport, load_pipeline_file,
};
use dataforge_plugin::{Plugin, PluginMetadata, PluginRegistry};
use serde_json::Value;
use tracing::info;

use crate::error::{OrchestratorError, Result};

/// Owns the plugins available to pipelines and runs pipelines against them.
///
/// Register every plugin first; running takes `&self`, so a populated
/// orchestrator can be shared by concurrent runs.
#[derive(Debug, Default)]
pub struct Orchestrator {
    registry: PluginRegistry,
    executor_config: ExecutorConfig,
    pipelines_dir: Option<PathBuf>,
}

impl Orchestrator {
    /// Create an orchestrator with default executor settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an orchestrator with explicit executor settings.
    pub fn with_executor_config(executor_config: ExecutorConfig) -> Self {
        Self {
            executor_config,
            ..Self::default()
        }
    }

    /// Create an orchestrator from the `[pipeline]` section of a config.
    ///
    /// The config is validated first, so values set in code get the same
    /// checks as values read from TOML.
    pub fn from_config(config: &DataforgeConfig) -> Result<Self> {
        config.validate()?;
        let section = config.pipeline();
        Ok(Self {
            registry: PluginRegistry::new(),
            executor_config: ExecutorConfig::from(&section),
            pipelines_dir: section.pipelines_dir,
        })
    }

    pub fn executor_config(&self) -> &ExecutorConfig {
        &self.executor_config
    }

    // ── Plugins ─────────────────────────────────────────────────────────

    /// Register `plugin` under `name`, replacing any earlier binding.
    pub fn register_plugin<P: Plugin + 'static>(
        &mut self,
        name: impl Into<String>,
        plugin: P,
    ) -> Result<()> {
        self.registry.register(name, plugin)?;
        Ok(())
    }

    /// Register a shared plugin instance.
    pub fn register_plugin_arc(
        &mut self,
        name: impl Into<String>,
        plugin: Arc<dyn Plugin>,
    ) -> Result<()> {
        self.registry.register_arc(name, plugin)?;
        Ok(())
    }

    /// Get the plugin registered under `name`.
    pub fn get_plugin(&self, name: &str) -> Result<Arc<dyn Plugin>> {
        Ok(self.registry.get(name)?)
    }

    /// Every registration, ordered by name.
    pub fn list_plugins(&self) -> &BTreeMap<String, Arc<dyn Plugin>> {
        self.registry.list()
    }

    /// Metadata of every registered plugin, ordered by registered name.
    pub fn plugin_metadata(&self) -> Vec<PluginMetadata> {
        self.registry.metadata()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    // ── Pipelines ───────────────────────────────────────────────────────

    fn executor(&self) -> PipelineExecutor<'_> {
        PipelineExecutor::new(&self.registry, self.executor_config.clone())
    }

    /// Run a pipeline; returns every stored result, or the first error.
    pub fn execute_pipeline(&self, pipeline: &PipelineConfig) -> Result<ExecutionContext> {
        Ok(self.executor().execute_pipeline(pipeline)?)
    }

    /// Run a pipeline given as a raw `{"steps": [...]}` document.
    pub fn execute_pipeline_value(&self, document: Value) -> Result<ExecutionContext> {
        let pipeline = PipelineConfig::from_value(document)?;
        self.execute_pipeline(&pipeline)
    }

    /// Run a pipeline and report its outcome, including partial results.
    pub fn run_pipeline(&self, pipeline: &PipelineConfig) -> RunReport {
        self.executor().run(pipeline)
    }

    /// Check a pipeline against the current registrations without running it.
    pub fn preflight(&self, pipeline: &PipelineConfig) -> Vec<PipelineError> {
        self.executor().preflight(pipeline)
    }

    /// Load one pipeline file.
    pub fn load_pipeline(&self, path: impl AsRef<Path>) -> Result<PipelineConfig> {
        Ok(load_pipeline_file(path.as_ref())?)
    }

    /// Load every pipeline in the configured pipelines directory.
    pub fn load_pipelines(&self) -> Result<PipelineLoader> {
        let dir = self
            .pipelines_dir
            .as_ref()
            .ok_or(OrchestratorError::NoPipelinesDir)?;
        let mut loader = PipelineLoader::new(dir)?;
        let events = loader.load_all();
        info!(
            loaded = loader.len(),
            files = events.len(),
            dir = %dir.display(),
            "pipelines directory scanned"
        );
        Ok(loader)
    }
}
