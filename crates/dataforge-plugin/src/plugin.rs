//! The plugin contract.

use serde_json::Value;

use crate::Result;

/// Trait every pipeline plugin implements.
///
/// Plugins are synchronous: `execute` may block on external work (an HTTP
/// round trip, a file write) and the pipeline waits for it. Plugins hold
/// whatever state they need from construction and are shared across runs,
/// hence `Send + Sync`.
///
/// Metadata is assembled outside the trait by [`PluginMetadata::of`](crate::PluginMetadata::of).
pub trait Plugin: Send + Sync {
    /// Get the name of this plugin.
    fn name(&self) -> &str;

    /// Get a human-readable description of what this plugin does.
    fn description(&self) -> &str;

    /// JSON Schema describing the expected input.
    ///
    /// Informational only; the pipeline never filters or coerces inputs
    /// against it.
    fn input_schema(&self) -> Value;

    /// JSON Schema describing the produced output.
    fn output_schema(&self) -> Value;

    /// Check whether `input` is acceptable. Must not have side effects.
    ///
    /// Conforming plugins call this from `execute` and fail fast with
    /// [`PluginError::InvalidInput`](crate::PluginError::InvalidInput).
    fn validate_input(&self, input: &Value) -> bool;

    /// Do the plugin's work.
    fn execute(&self, input: Value) -> Result<Value>;
}

impl std::fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name()).finish()
    }
}
