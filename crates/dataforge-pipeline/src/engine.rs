//! Sequential pipeline executor.
//!
//! Steps run strictly in document order on the calling thread. Each step
//! looks up its plugin, resolves its input against the results produced so
//! far, invokes the plugin, and stores the output. The first failure ends the
//! run; nothing is retried or compensated.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dataforge_config::{ContextKeying, DuplicatePolicy, PipelineSection};
use dataforge_plugin::{PluginError, PluginRegistry};
use serde_json::Value;
use tracing::{debug, debug_span, error, info, info_span, warn};
use uuid::Uuid;

use crate::context::{ExecutionContext, ReferenceResolver};
use crate::definition::{PipelineConfig, StepConfig};
use crate::error::{PipelineError, Result};
use crate::preflight;

/// Executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// What a step's result is stored under.
    pub context_key: ContextKeying,
    /// What happens when two steps write the same key.
    pub on_duplicate: DuplicatePolicy,
    /// Validate the whole pipeline before running any step.
    pub preflight: bool,
    /// Marker for lexical references; `None` disables them.
    pub reference_marker: Option<char>,
    /// Read `{"ref": "<key>"}` input objects as references.
    pub structural_references: bool,
    /// Reject inputs the plugin's own `validate_input` refuses.
    pub validate_inputs: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from(&PipelineSection::default())
    }
}

impl From<&PipelineSection> for ExecutorConfig {
    fn from(section: &PipelineSection) -> Self {
        Self {
            context_key: section.context_key,
            on_duplicate: section.on_duplicate,
            preflight: section.preflight,
            reference_marker: section
                .lexical_references
                .then_some(section.reference_marker),
            structural_references: section.structural_references,
            validate_inputs: section.validate_inputs,
        }
    }
}

impl ExecutorConfig {
    /// Resolver matching these settings.
    pub fn resolver(&self) -> ReferenceResolver {
        ReferenceResolver::new(self.reference_marker).with_structural(self.structural_references)
    }

    /// Key a step's result is stored under.
    pub fn context_key<'a>(&self, step: &'a StepConfig) -> &'a str {
        match (self.context_key, step.id.as_deref()) {
            (ContextKeying::StepAlias, Some(id)) => id,
            _ => &step.plugin,
        }
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle of one pipeline run.
///
/// `Pending` → `Running(0)` → … → `Running(n-1)` → `Completed`, or
/// `Failed` from any non-terminal state. Terminal states are final.
#[derive(Debug)]
pub enum RunState {
    Pending,
    /// Executing the step at this index.
    Running(usize),
    Completed,
    Failed(PipelineError),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The error that ended the run, if it failed.
    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of one pipeline run, including partial results on failure.
#[derive(Debug)]
pub struct RunReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Pipeline name, when the document has one.
    pub pipeline: Option<String>,
    /// Terminal state.
    pub state: RunState,
    /// Results stored before the run ended.
    pub context: ExecutionContext,
    /// Number of steps whose results were stored.
    pub steps_completed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.state.is_completed()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.state.error()
    }

    /// The full context on success, the error otherwise.
    pub fn into_result(self) -> Result<ExecutionContext> {
        match self.state {
            RunState::Failed(err) => Err(err),
            _ => Ok(self.context),
        }
    }

    /// Wall-clock duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Mutable state of a run in progress. Only `advance` and `fail` move the
/// state, so terminal states cannot be left.
struct PipelineRun {
    state: RunState,
    step_count: usize,
    context: ExecutionContext,
    /// Context key → index of the step that first wrote it.
    writers: HashMap<String, usize>,
    steps_completed: usize,
}

impl PipelineRun {
    fn new(step_count: usize) -> Self {
        Self {
            state: RunState::Pending,
            step_count,
            context: ExecutionContext::new(),
            writers: HashMap::new(),
            steps_completed: 0,
        }
    }

    /// Move to the next step, returning its index, or complete the run.
    fn advance(&mut self) -> Option<usize> {
        let next = match self.state {
            RunState::Pending => 0,
            RunState::Running(index) => index + 1,
            RunState::Completed | RunState::Failed(_) => return None,
        };

        if next < self.step_count {
            self.state = RunState::Running(next);
            Some(next)
        } else {
            self.state = RunState::Completed;
            None
        }
    }

    fn fail(&mut self, err: PipelineError) {
        if !self.state.is_terminal() {
            self.state = RunState::Failed(err);
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs pipelines against a plugin registry.
///
/// The executor borrows the registry; each run owns its own context, so one
/// executor can serve any number of runs, including concurrent ones.
#[derive(Debug, Clone)]
pub struct PipelineExecutor<'r> {
    registry: &'r PluginRegistry,
    config: ExecutorConfig,
    resolver: ReferenceResolver,
}

impl<'r> PipelineExecutor<'r> {
    pub fn new(registry: &'r PluginRegistry, config: ExecutorConfig) -> Self {
        let resolver = config.resolver();
        Self {
            registry,
            config,
            resolver,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a pipeline, returning the full context or the first error.
    pub fn execute_pipeline(&self, pipeline: &PipelineConfig) -> Result<ExecutionContext> {
        self.run(pipeline).into_result()
    }

    /// Check a pipeline without running it. Returns every problem found.
    pub fn preflight(&self, pipeline: &PipelineConfig) -> Vec<PipelineError> {
        preflight::check(pipeline, self.registry, &self.config)
    }

    /// Run a pipeline and report how it went.
    pub fn run(&self, pipeline: &PipelineConfig) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("pipeline_run", %run_id, pipeline = pipeline.display_name());
        let _enter = span.enter();

        info!(steps = pipeline.steps.len(), "starting pipeline execution");

        let mut run = PipelineRun::new(pipeline.steps.len());

        if self.config.preflight
            && let Some(err) = self.preflight(pipeline).into_iter().next()
        {
            run.fail(err);
        }

        while let Some(index) = run.advance() {
            let step = &pipeline.steps[index];
            if let Err(err) = self.execute_step(index, step, &mut run) {
                run.fail(err);
            }
        }

        let finished_at = Utc::now();
        match &run.state {
            RunState::Failed(err) => error!(
                step = ?err.step(),
                plugin = err.plugin().unwrap_or_default(),
                error = %err,
                "pipeline execution failed"
            ),
            _ => info!(
                steps_completed = run.steps_completed,
                duration_ms = (finished_at - started_at).num_milliseconds(),
                "pipeline execution completed"
            ),
        }

        RunReport {
            run_id,
            pipeline: pipeline.name.clone(),
            state: run.state,
            context: run.context,
            steps_completed: run.steps_completed,
            started_at,
            finished_at,
        }
    }

    fn execute_step(&self, index: usize, step: &StepConfig, run: &mut PipelineRun) -> Result<()> {
        let span = debug_span!("step", index, plugin = %step.plugin);
        let _enter = span.enter();

        let plugin = self
            .registry
            .get(&step.plugin)
            .map_err(|_| PipelineError::UnknownPlugin {
                step: index,
                plugin: step.plugin.clone(),
            })?;

        let input = self
            .resolver
            .resolve(&step.input, &run.context)
            .map_err(|missing| PipelineError::UnresolvedReference {
                step: index,
                plugin: step.plugin.clone(),
                key: missing.key,
            })?;

        if self.config.validate_inputs && !plugin.validate_input(&input) {
            return Err(PipelineError::Execution {
                step: index,
                plugin: step.plugin.clone(),
                source: PluginError::invalid_input(&step.plugin, "rejected by validate_input"),
            });
        }

        debug!("executing plugin");
        let output = plugin
            .execute(input)
            .map_err(|source| PipelineError::Execution {
                step: index,
                plugin: step.plugin.clone(),
                source,
            })?;

        let key = self.config.context_key(step);
        self.store(index, step, key, output, run)?;
        run.steps_completed += 1;
        debug!(key, "plugin executed successfully");
        Ok(())
    }

    fn store(
        &self,
        index: usize,
        step: &StepConfig,
        key: &str,
        output: Value,
        run: &mut PipelineRun,
    ) -> Result<()> {
        if let Some(&first_step) = run.writers.get(key) {
            match self.config.on_duplicate {
                DuplicatePolicy::Overwrite => {}
                DuplicatePolicy::Warn => {
                    warn!(key, first_step, "overwriting result of an earlier step");
                }
                DuplicatePolicy::Error => {
                    return Err(PipelineError::DuplicateKey {
                        step: index,
                        plugin: step.plugin.clone(),
                        key: key.to_string(),
                        first_step,
                    });
                }
            }
        } else {
            run.writers.insert(key.to_string(), index);
        }

        run.context.insert(key, output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_from_section() {
        let section = PipelineSection {
            context_key: ContextKeying::StepAlias,
            on_duplicate: DuplicatePolicy::Warn,
            preflight: true,
            lexical_references: false,
            reference_marker: '@',
            structural_references: true,
            validate_inputs: true,
            pipelines_dir: None,
        };
        let config = ExecutorConfig::from(&section);
        assert!(config.structural_references);
        assert!(config.resolver().structural());
        assert_eq!(config.context_key, ContextKeying::StepAlias);
        assert_eq!(config.on_duplicate, DuplicatePolicy::Warn);
        assert!(config.preflight);
        assert_eq!(config.reference_marker, None);
        assert!(config.validate_inputs);
    }

    #[test]
    fn test_default_executor_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.context_key, ContextKeying::PluginName);
        assert_eq!(config.on_duplicate, DuplicatePolicy::Overwrite);
        assert!(!config.preflight);
        assert_eq!(config.reference_marker, Some('$'));
        assert!(!config.structural_references);
        assert!(!config.validate_inputs);
    }

    #[test]
    fn test_context_key_selection() {
        let aliased = StepConfig::new("code_generator", Value::Null).with_id("draft");
        let plain = StepConfig::new("code_generator", Value::Null);

        let by_plugin = ExecutorConfig::default();
        assert_eq!(by_plugin.context_key(&aliased), "code_generator");

        let by_alias = ExecutorConfig {
            context_key: ContextKeying::StepAlias,
            ..ExecutorConfig::default()
        };
        assert_eq!(by_alias.context_key(&aliased), "draft");
        assert_eq!(by_alias.context_key(&plain), "code_generator");
    }

    #[test]
    fn test_run_state_transitions() {
        let mut run = PipelineRun::new(2);
        assert!(matches!(run.state, RunState::Pending));
        assert_eq!(run.advance(), Some(0));
        assert_eq!(run.advance(), Some(1));
        assert_eq!(run.advance(), None);
        assert!(run.state.is_completed());
        assert_eq!(run.advance(), None);

        // Completed is terminal
        run.fail(PipelineError::InvalidPipeline("late".into()));
        assert!(run.state.is_completed());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut run = PipelineRun::new(3);
        run.advance();
        run.fail(PipelineError::InvalidPipeline("boom".into()));
        assert_eq!(run.advance(), None);
        assert!(matches!(run.state, RunState::Failed(_)));
    }

    #[test]
    fn test_empty_pipeline_completes() {
        let mut run = PipelineRun::new(0);
        assert_eq!(run.advance(), None);
        assert!(run.state.is_completed());
    }
}
