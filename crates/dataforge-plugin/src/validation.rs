//! Registration-time contract checks.
//!
//! The [`Plugin`] trait guarantees every capability exists. What the type
//! system cannot express is checked here: the registration name must be
//! non-empty and both schemas must be JSON objects.

use serde_json::Value;

use crate::Plugin;

/// A reason a plugin cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// The registration name is empty.
    #[error("name cannot be empty")]
    EmptyName,

    /// A schema is not a JSON object.
    #[error("{schema} schema must be a JSON object, got {found}")]
    SchemaNotObject {
        schema: &'static str,
        found: &'static str,
    },
}

/// Validate a registration name. Any non-empty string is accepted.
pub fn validate_name(name: &str) -> Result<(), ContractViolation> {
    if name.is_empty() {
        return Err(ContractViolation::EmptyName);
    }
    Ok(())
}

/// Validate a plugin for registration under `name`.
pub fn validate_registration(name: &str, plugin: &dyn Plugin) -> Result<(), ContractViolation> {
    validate_name(name)?;
    check_schema("input", &plugin.input_schema())?;
    check_schema("output", &plugin.output_schema())?;
    Ok(())
}

fn check_schema(schema: &'static str, value: &Value) -> Result<(), ContractViolation> {
    if value.is_object() {
        return Ok(());
    }
    Err(ContractViolation::SchemaNotObject {
        schema,
        found: json_type_name(value),
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
