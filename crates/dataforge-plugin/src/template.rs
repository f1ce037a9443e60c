//! Named text templates.
//!
//! [`PromptTemplatePlugin`] assembles text (typically prompts for a code
//! generator) from a registered template and a parameters object.
//!
//! # Template Syntax
//!
//! - `{{field}}`: top-level parameter
//! - `{{source.config.base_url}}`: nested field access via dot notation
//! - `{{source.config.endpoints[0].path}}`: array index access
//!
//! Strings are inserted verbatim; other values are JSON-serialized.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::{Plugin, PluginError, Result};

/// Render `template` against a parameters object.
///
/// Every expression must resolve; a missing field is an error rather than an
/// empty substitution.
pub fn render_template(template: &str, params: &Value) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut remaining = template;

    while let Some(start) = remaining.find("{{") {
        let Some(end) = remaining[start..].find("}}") else {
            break; // Unclosed `{{`: keep the rest as text
        };
        rendered.push_str(&remaining[..start]);

        let inner = remaining[start + 2..start + end].trim();
        if inner.is_empty() {
            rendered.push_str(&remaining[start..start + end + 2]);
        } else {
            let value = resolve_path(params, inner)?;
            rendered.push_str(&value_to_string(value));
        }
        remaining = &remaining[start + end + 2..];
    }

    rendered.push_str(remaining);
    Ok(rendered)
}

// ---------------------------------------------------------------------------
// Path navigation
// ---------------------------------------------------------------------------

/// A segment of a dot-separated path, optionally with an array index.
#[derive(Debug)]
struct PathSegment<'a> {
    name: &'a str,
    index: Option<usize>,
}

impl std::fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.name, i),
            None => write!(f, "{}", self.name),
        }
    }
}

/// `"items[0].name"` → `[("items", Some(0)), ("name", None)]`
fn parse_path_segments(path: &str) -> Result<Vec<PathSegment<'_>>> {
    path.split('.')
        .map(|part| {
            parse_segment(part).ok_or_else(|| {
                PluginError::Template(format!(
                    "'{{{{{path}}}}}': malformed segment '{part}'"
                ))
            })
        })
        .collect()
}

/// `name` or `name[<index>]`; the closing bracket must end the segment.
fn parse_segment(part: &str) -> Option<PathSegment<'_>> {
    let Some(bracket_start) = part.find('[') else {
        if part.contains(']') {
            return None;
        }
        return Some(PathSegment {
            name: part,
            index: None,
        });
    };

    let name = &part[..bracket_start];
    let inner = part[bracket_start + 1..].strip_suffix(']')?;
    if name.contains(']') {
        return None;
    }
    let index = inner.parse::<usize>().ok()?;
    Some(PathSegment {
        name,
        index: Some(index),
    })
}

fn navigate_segment<'a>(value: &'a Value, segment: &PathSegment<'_>) -> Option<&'a Value> {
    let field = if segment.name.is_empty() {
        value
    } else {
        value.get(segment.name)?
    };

    match segment.index {
        Some(i) => field.get(i),
        None => Some(field),
    }
}

fn resolve_path<'a>(params: &'a Value, path: &str) -> Result<&'a Value> {
    let mut current = params;
    for segment in parse_path_segments(path)? {
        current = navigate_segment(current, &segment).ok_or_else(|| {
            PluginError::Template(format!(
                "'{{{{{path}}}}}': cannot resolve segment '{segment}'"
            ))
        })?;
    }
    Ok(current)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Plugin that renders one of its named templates.
///
/// Input: `{"prompt_type": "<template name>", "parameters": {...}}`.
/// Output: the rendered text as a JSON string.
#[derive(Debug, Clone)]
pub struct PromptTemplatePlugin {
    name: String,
    templates: BTreeMap<String, String>,
}

impl PromptTemplatePlugin {
    /// Create a plugin with no templates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            templates: BTreeMap::new(),
        }
    }

    /// Add (or replace) a named template.
    pub fn with_template(
        mut self,
        prompt_type: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.templates.insert(prompt_type.into(), template.into());
        self
    }

    /// Names of the available templates.
    pub fn prompt_types(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl Plugin for PromptTemplatePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Assembles text from a named template and a parameters object"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt_type": {
                    "type": "string",
                    "enum": self.prompt_types().collect::<Vec<_>>()
                },
                "parameters": {"type": "object"}
            },
            "required": ["prompt_type", "parameters"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "string",
            "description": "Rendered template"
        })
    }

    fn validate_input(&self, input: &Value) -> bool {
        input.get("prompt_type").is_some_and(Value::is_string)
            && input.get("parameters").is_some_and(Value::is_object)
    }

    fn execute(&self, input: Value) -> Result<Value> {
        if !self.validate_input(&input) {
            tracing::error!(
                plugin = %self.name,
                "input validation failed: missing required keys"
            );
            return Err(PluginError::invalid_input(
                &self.name,
                "expected 'prompt_type' (string) and 'parameters' (object)",
            ));
        }

        let prompt_type = input["prompt_type"].as_str().unwrap_or_default();
        let template = self
            .templates
            .get(prompt_type)
            .ok_or_else(|| {
                PluginError::unsupported(&self.name, format!("prompt type '{prompt_type}'"))
            })?;

        let rendered = render_template(template, &input["parameters"])?;
        tracing::debug!(
            plugin = %self.name,
            prompt_type,
            bytes = rendered.len(),
            "template rendered"
        );
        Ok(Value::String(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Value {
        json!({
            "pipeline_name": "pokemon_api_to_blob",
            "schedule": "0 0 * * *",
            "source": {
                "type": "rest_api",
                "config": {
                    "base_url": "https://pokeapi.co/api/v2",
                    "endpoints": [
                        {"name": "pokemon_list", "path": "/pokemon", "method": "GET"},
                        {"name": "pokemon_details", "path": "/pokemon/{name}", "method": "GET"}
                    ]
                }
            },
            "tools": ["search", "lookup"],
            "limit": 100,
            "paginate": true,
            "auth": null
        })
    }

    #[test]
    fn test_render_top_level_fields() {
        let out =
            render_template("Pipeline {{pipeline_name}} runs at {{schedule}}", &params()).unwrap();
        assert_eq!(out, "Pipeline pokemon_api_to_blob runs at 0 0 * * *");
    }

    #[test]
    fn test_render_nested_and_indexed() {
        let out = render_template(
            "{{source.config.base_url}}{{source.config.endpoints[1].path}}",
            &params(),
        )
        .unwrap();
        assert_eq!(out, "https://pokeapi.co/api/v2/pokemon/{name}");
    }

    #[test]
    fn test_render_non_string_values() {
        let out = render_template("{{limit}} {{paginate}} {{auth}} {{tools}}", &params()).unwrap();
        assert_eq!(out, r#"100 true null ["search","lookup"]"#);
    }

    #[test]
    fn test_render_whitespace_in_expression() {
        let out = render_template("{{ schedule }}", &params()).unwrap();
        assert_eq!(out, "0 0 * * *");
    }

    #[test]
    fn test_render_missing_field() {
        let err = render_template("{{destination.type}}", &params()).unwrap_err();
        assert!(matches!(err, PluginError::Template(_)));
        assert!(err.to_string().contains("cannot resolve segment 'destination'"));
    }

    #[test]
    fn test_render_index_out_of_bounds() {
        let err = render_template("{{source.config.endpoints[9].path}}", &params()).unwrap_err();
        assert!(err.to_string().contains("endpoints[9]"));
    }

    #[test]
    fn test_render_malformed_segments() {
        let params = json!({"a": [1, 2], "b": 1});
        for template in ["{{a]b[}}", "{{a[x]}}", "{{a[0}}", "{{a]}}", "{{a[0]b}}", "{{b].c}}"] {
            let err = render_template(template, &params).unwrap_err();
            assert!(
                err.to_string().contains("malformed segment"),
                "{template}: {err}"
            );
        }
    }

    #[test]
    fn test_render_root_index() {
        let out = render_template("{{[1]}}", &json!(["zero", "one"])).unwrap();
        assert_eq!(out, "one");
    }

    #[test]
    fn test_render_unclosed_and_empty_braces_kept() {
        let out = render_template("keep {{}} and {{ open", &params()).unwrap();
        assert_eq!(out, "keep {{}} and {{ open");
    }

    fn generator() -> PromptTemplatePlugin {
        PromptTemplatePlugin::new("prompt_generator")
            .with_template(
                "data_pipeline",
                "Create a pipeline from {{source.type}} named {{pipeline_name}}.",
            )
            .with_template("airflow_dag", "Convert to a DAG:\n{{pipeline_code}}")
    }

    #[test]
    fn test_plugin_renders_selected_template() {
        let out = generator()
            .execute(json!({"prompt_type": "data_pipeline", "parameters": params()}))
            .unwrap();
        assert_eq!(out, json!("Create a pipeline from rest_api named pokemon_api_to_blob."));
    }

    #[test]
    fn test_plugin_unknown_prompt_type() {
        let err = generator()
            .execute(json!({"prompt_type": "code_explanation", "parameters": {}}))
            .unwrap_err();
        match err {
            PluginError::Unsupported { plugin, operation } => {
                assert_eq!(plugin, "prompt_generator");
                assert!(operation.contains("code_explanation"));
            }
            other => panic!("Expected Unsupported, got: {other:?}"),
        }
    }

    #[test]
    fn test_plugin_validates_structure() {
        let plugin = generator();
        assert!(plugin.validate_input(&json!({"prompt_type": "x", "parameters": {}})));
        assert!(!plugin.validate_input(&json!({"prompt_type": "x"})));
        assert!(!plugin.validate_input(&json!({"prompt_type": 3, "parameters": {}})));
        assert!(!plugin.validate_input(&json!("data_pipeline")));

        let err = plugin.execute(json!({"parameters": {}})).unwrap_err();
        assert!(matches!(err, PluginError::InvalidInput { .. }));
    }

    #[test]
    fn test_plugin_malformed_template_is_an_error() {
        let plugin = PromptTemplatePlugin::new("t").with_template("x", "{{a]b[}}");
        let err = plugin
            .execute(json!({"prompt_type": "x", "parameters": {"a": 1}}))
            .unwrap_err();
        assert!(matches!(err, PluginError::Template(_)));
    }

    #[test]
    fn test_input_schema_lists_templates() {
        let schema = generator().input_schema();
        assert_eq!(
            schema["properties"]["prompt_type"]["enum"],
            json!(["airflow_dag", "data_pipeline"])
        );
    }
}
