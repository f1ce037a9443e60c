//! Error types for plugins and the registry.

use thiserror::Error;

use crate::validation::ContractViolation;

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors raised by a plugin while doing its work.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The input failed the plugin's own validation.
    #[error("invalid input for plugin '{plugin}': {reason}")]
    InvalidInput { plugin: String, reason: String },

    /// The input asked for something the plugin does not offer.
    #[error("plugin '{plugin}' does not support '{operation}'")]
    Unsupported { plugin: String, operation: String },

    /// A template could not be rendered.
    #[error("template error: {0}")]
    Template(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other failure inside the plugin.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl PluginError {
    /// Create an invalid input error.
    pub fn invalid_input(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(plugin: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            plugin: plugin.into(),
            operation: operation.into(),
        }
    }

    /// Create a failure from a plain message.
    pub fn failed(msg: impl std::fmt::Display) -> Self {
        Self::Failed(anyhow::anyhow!("{msg}"))
    }
}

/// Errors raised by [`PluginRegistry`](crate::PluginRegistry) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The plugin cannot be registered under this name.
    #[error("plugin '{name}' does not satisfy the plugin contract: {source}")]
    NonConforming {
        name: String,
        #[source]
        source: ContractViolation,
    },

    /// No plugin is registered under this name.
    #[error("plugin '{0}' not registered")]
    NotFound(String),
}
