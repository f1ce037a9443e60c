//! Run-scoped execution context and reference resolution.
//!
//! Each pipeline run gets a fresh [`ExecutionContext`] mapping context keys
//! to results in first-write order. Step inputs that refer to earlier
//! results are resolved against it by a [`ReferenceResolver`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::StepInput;

/// Results produced so far in one pipeline run.
///
/// Keys keep the position of their first write; a later write to the same
/// key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: IndexMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a result, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Keys in first-write order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the context, yielding the ordered map.
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.entries
    }
}

impl IntoIterator for ExecutionContext {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl std::ops::Index<&str> for ExecutionContext {
    type Output = Value;

    /// Panics if `key` is absent, like `IndexMap`.
    fn index(&self, key: &str) -> &Value {
        &self.entries[key]
    }
}

/// A reference to a key that is not in the context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("referenced output '{key}' not found in context")]
pub struct MissingReference {
    pub key: String,
}

/// Turns step inputs into plugin inputs.
///
/// Typed references (`StepInput::Reference`) are always honoured. When a
/// marker is configured, literal strings starting with it are references
/// too: `"$A"` means "the result stored under `A`". With structural
/// references enabled, a literal `{"ref": "A"}` object means the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceResolver {
    marker: Option<char>,
    structural: bool,
}

impl ReferenceResolver {
    /// Resolver recognising lexical references with `marker`, or none when
    /// `None`. Structural references are off.
    pub fn new(marker: Option<char>) -> Self {
        Self {
            marker,
            structural: false,
        }
    }

    /// Resolver that only honours typed references.
    pub fn typed_only() -> Self {
        Self::new(None)
    }

    /// Also read `{"ref": "<key>"}` literals as references.
    pub fn with_structural(mut self, structural: bool) -> Self {
        self.structural = structural;
        self
    }

    pub fn marker(&self) -> Option<char> {
        self.marker
    }

    pub fn structural(&self) -> bool {
        self.structural
    }

    /// The key `input` refers to, if it is a reference.
    pub fn reference_key<'a>(&self, input: &'a StepInput) -> Option<&'a str> {
        match input {
            StepInput::Reference(key) => Some(key),
            StepInput::Literal(value) => self
                .lexical_key(value)
                .or_else(|| self.structural_key(value)),
        }
    }

    fn lexical_key<'a>(&self, value: &'a Value) -> Option<&'a str> {
        let marker = self.marker?;
        value.as_str()?.strip_prefix(marker)
    }

    fn structural_key<'a>(&self, value: &'a Value) -> Option<&'a str> {
        if !self.structural {
            return None;
        }
        StepInput::structural_key(value)
    }

    /// Produce the value to hand a plugin.
    ///
    /// References yield a copy of the stored result; literals pass through.
    pub fn resolve(
        &self,
        input: &StepInput,
        context: &ExecutionContext,
    ) -> Result<Value, MissingReference> {
        if let Some(key) = self.reference_key(input) {
            return context.get(key).cloned().ok_or_else(|| MissingReference {
                key: key.to_string(),
            });
        }
        match input {
            StepInput::Literal(value) => Ok(value.clone()),
            StepInput::Reference(key) => Err(MissingReference { key: key.clone() }),
        }
    }
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new(Some(dataforge_config::DEFAULT_REFERENCE_MARKER))
    }
}
