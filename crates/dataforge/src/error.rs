//! Error types for the orchestrator facade.

use dataforge_config::ConfigError;
use dataforge_pipeline::PipelineError;
use dataforge_plugin::RegistryError;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors surfaced by [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Registration was rejected or a lookup missed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A pipeline failed to load or run.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Configuration could not be loaded or holds an unusable value.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No pipelines directory is configured.
    #[error("No pipelines directory configured (set pipeline.pipelines_dir)")]
    NoPipelinesDir,

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
