//! Filtering of sensitive request parameters.
//!
//! [`RedactionFilter`] lowercases its field names once at construction and
//! only clones the parts of a value that actually change.

use crate::logging::constants::{DEFAULT_FILTER_PARAMETERS, DEFAULT_FILTER_REPLACEMENT};
use crate::request::Params;
use serde_json::Value;
use std::collections::HashSet;

/// Capability that removes sensitive values from request parameters.
pub trait ParameterFilter: Send + Sync {
    /// Returns the parameters with sensitive values replaced.
    fn filter(&self, params: Params) -> Params;
}

impl<F> ParameterFilter for F
where
    F: Fn(Params) -> Params + Send + Sync,
{
    fn filter(&self, params: Params) -> Params {
        self(params)
    }
}

/// Replaces values whose key contains any configured field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionFilter {
    fields_lower: HashSet<String>,
    replacement: String,
}

impl Default for RedactionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_PARAMETERS.iter().copied())
    }
}

impl RedactionFilter {
    /// Creates a filter for the given field names.
    pub fn new(fields: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            fields_lower: fields
                .into_iter()
                .map(|field| field.as_ref().to_lowercase())
                .filter(|field| !field.is_empty())
                .collect(),
            replacement: DEFAULT_FILTER_REPLACEMENT.to_string(),
        }
    }

    /// Sets the replacement string.
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    /// Returns true if `key` names a sensitive value.
    pub fn is_sensitive(&self, key: &str) -> bool {
        let key_lower = key.to_lowercase();
        self.fields_lower
            .iter()
            .any(|field| key_lower.contains(field.as_str()))
    }

    /// Redacts sensitive fields anywhere inside `value`.
    pub fn redact(&self, value: &Value) -> Value {
        self.redact_internal(value)
            .unwrap_or_else(|| value.clone())
    }

    /// Returns None if nothing needed redaction.
    fn redact_internal(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Object(map) => {
                let mut redacted = serde_json::Map::new();
                let mut any_changed = false;

                for (key, val) in map {
                    if self.is_sensitive(key) {
                        redacted.insert(key.clone(), Value::String(self.replacement.clone()));
                        any_changed = true;
                    } else if let Some(redacted_val) = self.redact_internal(val) {
                        redacted.insert(key.clone(), redacted_val);
                        any_changed = true;
                    } else {
                        redacted.insert(key.clone(), val.clone());
                    }
                }

                any_changed.then_some(Value::Object(redacted))
            }
            Value::Array(arr) => {
                let mut any_changed = false;
                let redacted: Vec<Value> = arr
                    .iter()
                    .map(|val| match self.redact_internal(val) {
                        Some(redacted_val) => {
                            any_changed = true;
                            redacted_val
                        }
                        None => val.clone(),
                    })
                    .collect();

                any_changed.then_some(Value::Array(redacted))
            }
            _ => None,
        }
    }
}

impl ParameterFilter for RedactionFilter {
    fn filter(&self, params: Params) -> Params {
        params
            .into_iter()
            .map(|(key, value)| {
                if self.is_sensitive(&key) {
                    (key, Value::String(self.replacement.clone()))
                } else {
                    let value = self.redact_internal(&value).unwrap_or(value);
                    (key, value)
                }
            })
            .collect()
    }
}
