//! Plugin metadata assembly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Plugin;

/// Descriptive record of a plugin, for documentation and tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

impl PluginMetadata {
    /// Collect metadata from a plugin.
    pub fn of<P: Plugin + ?Sized>(plugin: &P) -> Self {
        Self {
            name: plugin.name().to_string(),
            description: plugin.description().to_string(),
            input_schema: plugin.input_schema(),
            output_schema: plugin.output_schema(),
        }
    }
}
