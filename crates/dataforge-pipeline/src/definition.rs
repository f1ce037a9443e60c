//! Declarative pipeline definitions.
//!
//! A pipeline is an ordered list of steps. Each step names a registered
//! plugin and the input to hand it; an input may instead reference the output
//! of an earlier step.
//!
//! # Example TOML
//!
//! ```toml
//! name = "pokemon_api_to_blob"
//! description = "Generate pipeline code, then convert it to a DAG"
//!
//! [[steps]]
//! plugin = "prompt_generator"
//! input = { prompt_type = "data_pipeline", parameters = { source = "rest_api" } }
//!
//! [[steps]]
//! plugin = "code_generator"
//! input = "$prompt_generator"
//!
//! [[steps]]
//! plugin = "dag_converter"
//! input = { ref = "code_generator" }
//! ```
//!
//! The same document can be written as JSON or YAML. Inputs in a document
//! are always parsed as literals; whether `"$code_generator"` or
//! `{ ref = "code_generator" }` refers to an earlier result is decided at run
//! time by the [`ReferenceResolver`](crate::ReferenceResolver) settings.

use std::path::Path;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Key of the structural reference form `{"ref": "<key>"}`.
pub const REF_KEY: &str = "ref";

/// Input handed to a step's plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    /// A value from a document or caller. It may still read as a reference
    /// when the resolver recognises lexical or structural forms.
    Literal(Value),
    /// The stored result of an earlier step. Only built through
    /// [`StepInput::reference`]; always resolved.
    Reference(String),
}

impl StepInput {
    /// Build a literal input.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Build a reference to the result stored under `key`.
    pub fn reference(key: impl Into<String>) -> Self {
        Self::Reference(key.into())
    }

    /// The referenced key, for typed references.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(key) => Some(key),
            Self::Literal(_) => None,
        }
    }

    /// The key of a `{"ref": "<key>"}` object: exactly one entry, a string
    /// under `ref`.
    pub fn structural_key(value: &Value) -> Option<&str> {
        match value {
            Value::Object(map) if map.len() == 1 => map.get(REF_KEY)?.as_str(),
            _ => None,
        }
    }
}

impl Default for StepInput {
    fn default() -> Self {
        Self::Literal(Value::Null)
    }
}

impl From<Value> for StepInput {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// References serialize to the `{"ref": "<key>"}` form, which reads back as
/// a reference when structural references are enabled.
impl Serialize for StepInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => value.serialize(serializer),
            Self::Reference(key) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(REF_KEY, key)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for StepInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Literal)
    }
}

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Registered name of the plugin to invoke.
    pub plugin: String,

    /// Optional alias, used as the context key under step-alias keying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Input for the plugin. Absent means `null`.
    #[serde(default)]
    pub input: StepInput,
}

impl StepConfig {
    /// Create a step.
    pub fn new(plugin: impl Into<String>, input: impl Into<StepInput>) -> Self {
        Self {
            plugin: plugin.into(),
            id: None,
            input: input.into(),
        }
    }

    /// Set the step alias.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// An ordered list of steps plus informational metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Steps, executed in order.
    pub steps: Vec<StepConfig>,
}

/// Document format of a pipeline file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineFormat {
    Toml,
    Json,
    Yaml,
}

impl PipelineFormat {
    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction & parsing
// ---------------------------------------------------------------------------

impl PipelineConfig {
    /// Create a pipeline from steps.
    pub fn new(steps: Vec<StepConfig>) -> Self {
        Self {
            name: None,
            description: None,
            steps,
        }
    }

    /// Set the pipeline name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a step.
    pub fn step(mut self, plugin: impl Into<String>, input: impl Into<StepInput>) -> Self {
        self.steps.push(StepConfig::new(plugin, input));
        self
    }

    /// Name for logs and reports.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Parse a pipeline from a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| PipelineError::invalid(format!("malformed pipeline: {e}")))
    }

    /// Parse a pipeline from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| PipelineError::invalid(format!("JSON parse error: {e}")))
    }

    /// Parse a pipeline from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| PipelineError::invalid(format!("TOML parse error: {e}")))
    }

    /// Parse a pipeline from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str)
            .map_err(|e| PipelineError::invalid(format!("YAML parse error: {e}")))
    }

    /// Load a pipeline from a `.toml`, `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = PipelineFormat::from_path(path).ok_or_else(|| {
            PipelineError::invalid(format!(
                "unsupported pipeline file extension: {}",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::invalid(format!("failed to read {}: {e}", path.display()))
        })?;

        match format {
            PipelineFormat::Toml => Self::from_toml(&content),
            PipelineFormat::Json => Self::from_json(&content),
            PipelineFormat::Yaml => Self::from_yaml(&content),
        }
    }
}

impl TryFrom<Value> for PipelineConfig {
    type Error = PipelineError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl PipelineConfig {
    /// Check the document's own structure.
    ///
    /// Checks:
    /// - Every step names a plugin
    /// - Step aliases are non-empty
    ///
    /// Repeated aliases are left to the duplicate-key policy. Whether
    /// plugins exist and references are ordered correctly depends on a
    /// registry; see [`preflight`](crate::preflight).
    pub fn validate(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if step.plugin.trim().is_empty() {
                return Err(PipelineError::invalid(format!(
                    "step {index}: plugin name cannot be empty"
                )));
            }
            if step.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
                return Err(PipelineError::invalid(format!(
                    "step {index}: id cannot be empty"
                )));
            }
        }
        Ok(())
    }
}
