//! Error types for the pipeline executor.

use dataforge_plugin::PluginError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Broad category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pipeline or its plugin bindings are wrong.
    Configuration,
    /// A step referenced a result that does not exist (yet).
    Reference,
    /// A plugin failed while doing its work.
    Execution,
}

/// Errors that can occur while loading or running a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step names a plugin that is not registered.
    #[error("step {step}: plugin '{plugin}' not registered")]
    UnknownPlugin { step: usize, plugin: String },

    /// A step references a result absent from the execution context.
    #[error("step {step}: referenced output '{key}' not found in context")]
    UnresolvedReference {
        step: usize,
        plugin: String,
        key: String,
    },

    /// A plugin returned an error.
    #[error("step {step}: plugin '{plugin}' failed: {source}")]
    Execution {
        step: usize,
        plugin: String,
        #[source]
        source: PluginError,
    },

    /// A step wrote a context key an earlier step already wrote, and the
    /// duplicate policy forbids it.
    #[error("step {step}: context key '{key}' already written by step {first_step}")]
    DuplicateKey {
        step: usize,
        plugin: String,
        key: String,
        first_step: usize,
    },

    /// The pipeline document is malformed.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),
}

impl PipelineError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownPlugin { .. } | Self::DuplicateKey { .. } | Self::InvalidPipeline(_) => {
                ErrorKind::Configuration
            }
            Self::UnresolvedReference { .. } => ErrorKind::Reference,
            Self::Execution { .. } => ErrorKind::Execution,
        }
    }

    /// Index of the step that failed, if the error belongs to a step.
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::UnknownPlugin { step, .. }
            | Self::UnresolvedReference { step, .. }
            | Self::Execution { step, .. }
            | Self::DuplicateKey { step, .. } => Some(*step),
            Self::InvalidPipeline(_) => None,
        }
    }

    /// Plugin named by the failing step, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::UnknownPlugin { plugin, .. }
            | Self::UnresolvedReference { plugin, .. }
            | Self::Execution { plugin, .. }
            | Self::DuplicateKey { plugin, .. } => Some(plugin),
            Self::InvalidPipeline(_) => None,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidPipeline(msg.into())
    }
}
