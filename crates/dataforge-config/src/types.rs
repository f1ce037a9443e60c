//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [pipeline]               # executor policy
//! context_key = "plugin_name"
//! on_duplicate = "overwrite"
//! preflight = false
//!
//! [logging]                # console / file logging
//! level = "info"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default character marking a string input as a reference to an earlier result.
pub const DEFAULT_REFERENCE_MARKER: char = '$';

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataforgeConfig {
    /// Pipeline executor configuration.
    pub pipeline: Option<PipelineSection>,

    /// Logging configuration.
    pub logging: Option<LoggingConfig>,
}

impl DataforgeConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: DataforgeConfig) {
        if other.pipeline.is_some() {
            self.pipeline = other.pipeline;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The effective pipeline section (defaults when absent).
    pub fn pipeline(&self) -> PipelineSection {
        self.pipeline.clone().unwrap_or_default()
    }

    /// The effective logging section (defaults when absent).
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref pipeline) = self.pipeline {
            pipeline.validate()?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// How step results are keyed in the execution context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKeying {
    /// Key by the plugin name; a plugin used twice overwrites its earlier result.
    #[default]
    PluginName,
    /// Key by the step's `id` alias when present, otherwise by plugin name.
    StepAlias,
}

/// What happens when a step writes a context key an earlier step already wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later result silently replaces the earlier one.
    #[default]
    Overwrite,
    /// Later result replaces the earlier one and a warning is logged.
    Warn,
    /// The run fails with a configuration error.
    Error,
}

/// Pipeline executor configuration (the `[pipeline]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Context keying mode.
    pub context_key: ContextKeying,
    /// Duplicate context key policy.
    pub on_duplicate: DuplicatePolicy,
    /// Validate the whole step list before the first plugin runs.
    pub preflight: bool,
    /// Treat string inputs starting with `reference_marker` as references.
    pub lexical_references: bool,
    /// Marker for lexical references.
    pub reference_marker: char,
    /// Treat an input object whose only entry is a string under `ref` as a
    /// reference. Off by default so such objects reach plugins unchanged.
    pub structural_references: bool,
    /// Call `validate_input` before `execute` and fail on `false`.
    pub validate_inputs: bool,
    /// Directory of pipeline definition files.
    pub pipelines_dir: Option<PathBuf>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            context_key: ContextKeying::default(),
            on_duplicate: DuplicatePolicy::default(),
            preflight: false,
            lexical_references: true,
            reference_marker: DEFAULT_REFERENCE_MARKER,
            structural_references: false,
            validate_inputs: false,
            pipelines_dir: None,
        }
    }
}

impl PipelineSection {
    /// Reject markers that would make ordinary inputs ambiguous.
    pub fn validate(&self) -> Result<()> {
        if self.reference_marker.is_whitespace() || self.reference_marker.is_alphanumeric() {
            return Err(ConfigError::invalid_value(
                "pipeline.reference_marker",
                format!(
                    "'{}' cannot be used as a marker (use punctuation such as '$')",
                    self.reference_marker
                ),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration (the `[logging]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive for console output (e.g. `"info"`, `"dataforge=debug"`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit console output as JSON lines.
    pub json: bool,
    /// Directory for daily-rotated JSON log files. Disabled when unset.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_dir: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
