//! Sequential pipeline execution for Dataforge.
//!
//! A pipeline is an ordered list of steps, each invoking one registered
//! plugin. Steps pass data forward through a run-scoped
//! [`ExecutionContext`]: a step's input may reference the stored result of
//! an earlier step, lexically (`"$A"`) or, when enabled, structurally
//! (`{"ref": "A"}`).
//!
//! ```
//! use dataforge_pipeline::{ExecutorConfig, PipelineConfig, PipelineExecutor};
//! use dataforge_plugin::{FnPlugin, PluginRegistry};
//! use serde_json::json;
//!
//! let mut registry = PluginRegistry::new();
//! registry
//!     .register("A", FnPlugin::new("A", |v| Ok(json!(v.as_i64().unwrap_or(0) * 2))))
//!     .unwrap();
//! registry
//!     .register("B", FnPlugin::new("B", |v| Ok(json!(v.as_i64().unwrap_or(0) + 1))))
//!     .unwrap();
//!
//! let pipeline = PipelineConfig::default().step("A", json!(5)).step("B", json!("$A"));
//! let executor = PipelineExecutor::new(&registry, ExecutorConfig::default());
//! let context = executor.execute_pipeline(&pipeline).unwrap();
//!
//! assert_eq!(context["A"], json!(10));
//! assert_eq!(context["B"], json!(11));
//! ```

pub mod context;
pub mod definition;
pub mod engine;
pub mod error;
pub mod loader;
pub mod preflight;

pub use context::{ExecutionContext, MissingReference, ReferenceResolver};
pub use definition::{PipelineConfig, PipelineFormat, StepConfig, StepInput};
pub use engine::{ExecutorConfig, PipelineExecutor, RunReport, RunState};
pub use error::{ErrorKind, PipelineError, Result};
pub use loader::{PipelineEvent, PipelineLoader, load_pipeline_file};
