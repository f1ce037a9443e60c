//! Dataforge: a plugin registry and a sequential pipeline executor.
//!
//! Plugins are registered on an [`Orchestrator`] under a name. A pipeline is
//! an ordered list of steps; each step invokes one plugin, and its input may
//! refer to the result of an earlier step. Results accumulate in a run-scoped
//! [`ExecutionContext`] returned when the run completes.
//!
//! ```
//! use dataforge::{FnPlugin, Orchestrator, PipelineConfig};
//! use serde_json::json;
//!
//! let mut orchestrator = Orchestrator::new();
//! let double = FnPlugin::new("double", |v| Ok(json!(v.as_i64().unwrap_or(0) * 2)));
//! let increment = FnPlugin::new("increment", |v| Ok(json!(v.as_i64().unwrap_or(0) + 1)));
//! orchestrator.register_plugin("A", double).unwrap();
//! orchestrator.register_plugin("B", increment).unwrap();
//!
//! let pipeline = PipelineConfig::from_value(json!({
//!     "steps": [
//!         {"plugin": "A", "input": 5},
//!         {"plugin": "B", "input": "$A"}
//!     ]
//! }))
//! .unwrap();
//!
//! let context = orchestrator.execute_pipeline(&pipeline).unwrap();
//! assert_eq!(context["A"], json!(10));
//! assert_eq!(context["B"], json!(11));
//! ```

pub mod error;
pub mod logging;
pub mod orchestrator;

pub use error::{OrchestratorError, Result};
pub use logging::init_logging;
pub use orchestrator::Orchestrator;

pub use dataforge_config::{
    ContextKeying, DataforgeConfig, DuplicatePolicy, LoggingConfig, PipelineSection, load_config,
};
pub use dataforge_pipeline::{
    ErrorKind, ExecutionContext, ExecutorConfig, PipelineConfig, PipelineError, RunReport,
    RunState, StepConfig, StepInput,
};
pub use dataforge_plugin::{
    FnPlugin, Plugin, PluginError, PluginMetadata, PluginRegistry, PromptTemplatePlugin,
    RegistryError,
};
