//! Name-to-plugin registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::Plugin;
use crate::error::RegistryError;
use crate::metadata::PluginMetadata;
use crate::validation::validate_registration;

/// Registry of plugins available to pipelines.
///
/// Populate it before running pipelines: registration takes `&mut self`,
/// lookups take `&self`, so a registry shared by concurrent runs is
/// read-only for as long as they hold it.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            plugins: BTreeMap::new(),
        }
    }

    /// Register a plugin under `name`.
    ///
    /// If a plugin with the same name already exists, it is replaced. A
    /// rejected registration leaves the registry unchanged.
    pub fn register<P: Plugin + 'static>(
        &mut self,
        name: impl Into<String>,
        plugin: P,
    ) -> Result<(), RegistryError> {
        self.register_arc(name, Arc::new(plugin))
    }

    /// Register a plugin from an Arc.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        plugin: Arc<dyn Plugin>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        validate_registration(&name, plugin.as_ref())
            .map_err(|source| RegistryError::NonConforming {
                name: name.clone(),
                source,
            })?;

        if let Some(previous) = self.plugins.insert(name.clone(), plugin) {
            debug!(plugin = %name, replaced = previous.name(), "plugin registration replaced");
        } else {
            debug!(plugin = %name, "plugin registered");
        }
        Ok(())
    }

    /// Get a plugin by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Plugin>, RegistryError> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Check if a plugin is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Read-only view of every registration, ordered by name.
    pub fn list(&self) -> &BTreeMap<String, Arc<dyn Plugin>> {
        &self.plugins
    }

    /// Get all registered names.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(|s| s.as_str()).collect()
    }

    /// Metadata for every registration, ordered by registered name.
    pub fn metadata(&self) -> Vec<PluginMetadata> {
        self.plugins
            .values()
            .map(|plugin| PluginMetadata::of(plugin.as_ref()))
            .collect()
    }

    /// Get the number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnPlugin;
    use crate::validation::ContractViolation;
    use serde_json::json;

    fn doubler() -> FnPlugin {
        FnPlugin::new("doubler", |v| {
            let n = v.as_i64().unwrap_or_default();
            Ok(json!(n * 2))
        })
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = PluginRegistry::new();
        registry.register("A", doubler()).unwrap();

        assert!(registry.contains("A"));
        assert_eq!(registry.len(), 1);
        let plugin = registry.get("A").unwrap();
        assert_eq!(plugin.execute(json!(5)).unwrap(), json!(10));
    }

    #[test]
    fn test_get_missing() {
        let registry = PluginRegistry::new();
        match registry.get("nope").unwrap_err() {
            RegistryError::NotFound(name) => assert_eq!(name, "nope"),
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_register_overwrites_silently() {
        let mut registry = PluginRegistry::new();
        registry.register("A", doubler()).unwrap();
        registry
            .register("A", FnPlugin::new("constant", |_| Ok(json!("v2"))))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A").unwrap().name(), "constant");
    }

    #[test]
    fn test_rejected_registration_keeps_prior_binding() {
        let mut registry = PluginRegistry::new();
        registry.register("A", doubler()).unwrap();

        let bad = FnPlugin::new("bad", Ok).with_input_schema(json!(null));
        let err = registry.register("A", bad).unwrap_err();
        match err {
            RegistryError::NonConforming { name, source } => {
                assert_eq!(name, "A");
                assert_eq!(
                    source,
                    ContractViolation::SchemaNotObject {
                        schema: "input",
                        found: "null"
                    }
                );
            }
            other => panic!("Expected NonConforming, got: {other:?}"),
        }

        assert_eq!(registry.get("A").unwrap().name(), "doubler");
    }

    #[test]
    fn test_register_free_form_names() {
        let mut registry = PluginRegistry::new();
        registry.register("data loader", doubler()).unwrap();
        registry.register("générateur", doubler()).unwrap();
        assert!(registry.contains("data loader"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_empty_name() {
        let mut registry = PluginRegistry::new();
        let err = registry.register("", doubler()).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NonConforming {
                source: ContractViolation::EmptyName,
                ..
            }
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_and_names_sorted() {
        let mut registry = PluginRegistry::new();
        registry.register("b", doubler()).unwrap();
        registry.register("a", doubler()).unwrap();

        assert_eq!(registry.names(), vec!["a", "b"]);
        let keys: Vec<&String> = registry.list().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_metadata_listing() {
        let mut registry = PluginRegistry::new();
        registry
            .register("A", doubler().with_description("Doubles"))
            .unwrap();
        let meta = registry.metadata();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].name, "doubler");
        assert_eq!(meta[0].description, "Doubles");
    }

    #[test]
    fn test_register_arc_shares_instance() {
        let shared: Arc<dyn Plugin> = Arc::new(doubler());
        let mut registry = PluginRegistry::new();
        registry.register_arc("x", Arc::clone(&shared)).unwrap();
        registry.register_arc("y", Arc::clone(&shared)).unwrap();

        assert!(Arc::ptr_eq(&registry.get("x").unwrap(), &registry.get("y").unwrap()));
    }

    #[test]
    fn test_debug_lists_names() {
        let mut registry = PluginRegistry::new();
        registry.register("A", doubler()).unwrap();
        assert_eq!(format!("{registry:?}"), r#"PluginRegistry { plugins: ["A"] }"#);
    }
}
