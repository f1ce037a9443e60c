//! Closure-backed plugin.

use serde_json::{Value, json};

use crate::{Plugin, Result};

type Handler = Box<dyn Fn(Value) -> Result<Value> + Send + Sync>;
type Validator = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// A plugin whose work is a closure.
///
/// Useful for small transforms that don't warrant their own type. When a
/// validator is set, `execute` checks it first and fails with
/// [`PluginError::InvalidInput`](crate::PluginError::InvalidInput).
///
/// ```
/// use dataforge_plugin::{FnPlugin, Plugin};
/// use serde_json::json;
///
/// let add_one = FnPlugin::new("add_one", |v| Ok(json!(v.as_i64().unwrap_or(0) + 1)))
///     .with_validator(|v| v.is_i64());
/// assert_eq!(add_one.execute(json!(10)).unwrap(), json!(11));
/// assert!(add_one.execute(json!("ten")).is_err());
/// ```
pub struct FnPlugin {
    name: String,
    description: String,
    input_schema: Value,
    output_schema: Value,
    validator: Option<Validator>,
    handler: Handler,
}

impl FnPlugin {
    /// Create a plugin from a handler. Schemas default to `{}` (any value).
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: json!({}),
            output_schema: json!({}),
            validator: None,
            handler: Box::new(handler),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the input schema.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the output schema.
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = schema;
        self
    }

    /// Set the input validator.
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    fn output_schema(&self) -> Value {
        self.output_schema.clone()
    }

    fn validate_input(&self, input: &Value) -> bool {
        self.validator.as_ref().is_none_or(|check| check(input))
    }

    fn execute(&self, input: Value) -> Result<Value> {
        if !self.validate_input(&input) {
            return Err(crate::PluginError::invalid_input(
                &self.name,
                "rejected by validator",
            ));
        }
        (self.handler)(input)
    }
}

impl std::fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}
