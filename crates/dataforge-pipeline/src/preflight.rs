//! Static checks over a whole pipeline before any plugin runs.
//!
//! The check walks the steps in order, tracking which context keys would
//! exist after each one, and reports:
//! - structural problems in the document
//! - steps naming unregistered plugins
//! - references to keys no earlier step writes
//! - repeated keys when the duplicate policy is `error`

use std::collections::HashMap;

use dataforge_config::DuplicatePolicy;
use dataforge_plugin::PluginRegistry;
use tracing::debug;

use crate::definition::PipelineConfig;
use crate::engine::ExecutorConfig;
use crate::error::PipelineError;

/// Check `pipeline` against `registry`. An empty result means every step
/// would find its plugin and its input.
///
/// A step naming an unknown plugin is still assumed to write its key, so
/// one bad name produces one finding instead of a cascade.
pub fn check(
    pipeline: &PipelineConfig,
    registry: &PluginRegistry,
    config: &ExecutorConfig,
) -> Vec<PipelineError> {
    if let Err(err) = pipeline.validate() {
        return vec![err];
    }

    let resolver = config.resolver();
    let mut findings = Vec::new();
    let mut written: HashMap<&str, usize> = HashMap::new();

    for (index, step) in pipeline.steps.iter().enumerate() {
        if !registry.contains(&step.plugin) {
            findings.push(PipelineError::UnknownPlugin {
                step: index,
                plugin: step.plugin.clone(),
            });
        }

        if let Some(key) = resolver.reference_key(&step.input)
            && !written.contains_key(key)
        {
            findings.push(PipelineError::UnresolvedReference {
                step: index,
                plugin: step.plugin.clone(),
                key: key.to_string(),
            });
        }

        let key = config.context_key(step);
        match written.get(key) {
            Some(&first_step) if config.on_duplicate == DuplicatePolicy::Error => {
                findings.push(PipelineError::DuplicateKey {
                    step: index,
                    plugin: step.plugin.clone(),
                    key: key.to_string(),
                    first_step,
                });
            }
            Some(_) => {}
            None => {
                written.insert(key, index);
            }
        }
    }

    debug!(
        pipeline = pipeline.display_name(),
        findings = findings.len(),
        "pre-flight check finished"
    );
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{StepConfig, StepInput};
    use dataforge_config::ContextKeying;
    use dataforge_plugin::FnPlugin;
    use serde_json::json;

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register("A", FnPlugin::new("A", Ok)).unwrap();
        registry.register("B", FnPlugin::new("B", Ok)).unwrap();
        registry
    }

    #[test]
    fn test_clean_pipeline() {
        let pipeline = PipelineConfig::default()
            .step("A", json!(5))
            .step("B", json!("$A"));
        assert!(check(&pipeline, &registry(), &ExecutorConfig::default()).is_empty());
    }

    #[test]
    fn test_reports_every_problem() {
        let pipeline = PipelineConfig::default()
            .step("B", json!("$A"))
            .step("C", StepInput::reference("B"))
            .step("A", json!("$missing"));
        let findings = check(&pipeline, &registry(), &ExecutorConfig::default());

        assert_eq!(findings.len(), 3);
        match &findings[0] {
            PipelineError::UnresolvedReference { step, key, .. } => {
                assert_eq!(*step, 0);
                assert_eq!(key, "A");
            }
            other => panic!("Expected UnresolvedReference, got: {other:?}"),
        }
        match &findings[1] {
            PipelineError::UnknownPlugin { step, plugin } => {
                assert_eq!(*step, 1);
                assert_eq!(plugin, "C");
            }
            other => panic!("Expected UnknownPlugin, got: {other:?}"),
        }
        assert!(matches!(
            &findings[2],
            PipelineError::UnresolvedReference { step: 2, key, .. } if key == "missing"
        ));
    }

    #[test]
    fn test_unknown_plugin_does_not_cascade() {
        let pipeline = PipelineConfig::default()
            .step("C", json!(1))
            .step("A", json!("$C"));
        let findings = check(&pipeline, &registry(), &ExecutorConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(matches!(findings[0], PipelineError::UnknownPlugin { step: 0, .. }));
    }

    #[test]
    fn test_duplicate_key_only_under_error_policy() {
        let pipeline = PipelineConfig::default().step("A", json!(1)).step("A", json!(2));

        let lenient = ExecutorConfig::default();
        assert!(check(&pipeline, &registry(), &lenient).is_empty());

        let strict = ExecutorConfig {
            on_duplicate: DuplicatePolicy::Error,
            ..ExecutorConfig::default()
        };
        let findings = check(&pipeline, &registry(), &strict);
        assert!(matches!(
            &findings[..],
            [PipelineError::DuplicateKey { step: 1, first_step: 0, .. }]
        ));
    }

    #[test]
    fn test_alias_keys_are_simulated() {
        let pipeline = PipelineConfig::new(vec![
            StepConfig::new("A", json!(1)).with_id("first"),
            StepConfig::new("B", json!("$first")),
        ]);

        let by_plugin = ExecutorConfig::default();
        assert_eq!(check(&pipeline, &registry(), &by_plugin).len(), 1);

        let by_alias = ExecutorConfig {
            context_key: ContextKeying::StepAlias,
            ..ExecutorConfig::default()
        };
        assert!(check(&pipeline, &registry(), &by_alias).is_empty());
    }

    #[test]
    fn test_repeated_alias_follows_duplicate_policy() {
        let pipeline = PipelineConfig::new(vec![
            StepConfig::new("A", json!(1)).with_id("draft"),
            StepConfig::new("B", json!(2)).with_id("draft"),
        ]);

        let overwrite = ExecutorConfig {
            context_key: ContextKeying::StepAlias,
            ..ExecutorConfig::default()
        };
        assert!(check(&pipeline, &registry(), &overwrite).is_empty());

        let strict = ExecutorConfig {
            on_duplicate: DuplicatePolicy::Error,
            ..overwrite
        };
        let findings = check(&pipeline, &registry(), &strict);
        assert!(matches!(
            &findings[..],
            [PipelineError::DuplicateKey { step: 1, first_step: 0, key, .. }] if key == "draft"
        ));
    }

    #[test]
    fn test_ref_objects_checked_only_when_structural() {
        let pipeline = PipelineConfig::default().step("A", json!({"ref": "missing"}));

        assert!(check(&pipeline, &registry(), &ExecutorConfig::default()).is_empty());

        let structural = ExecutorConfig {
            structural_references: true,
            ..ExecutorConfig::default()
        };
        let findings = check(&pipeline, &registry(), &structural);
        assert!(matches!(
            &findings[..],
            [PipelineError::UnresolvedReference { step: 0, key, .. }] if key == "missing"
        ));
    }

    #[test]
    fn test_structural_problem_short_circuits() {
        let pipeline = PipelineConfig::default().step("", json!(1)).step("C", json!(2));
        let findings = check(&pipeline, &registry(), &ExecutorConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(matches!(findings[0], PipelineError::InvalidPipeline(_)));
    }
}
