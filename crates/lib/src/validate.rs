//! Validation support: trigger modes, errors as data, and the resolver seam.
//!
//! Validation failures are never `Err` values in this crate. They are plain
//! data ([`FieldError`]) stored in the controller's error tree and broadcast
//! to the UI; a failed rule leaves the mutation that triggered it untouched.
//!
//! Two dispatch strategies exist, selected by controller configuration: a
//! schema [`Resolver`] evaluating a path subset in one call, or per-field
//! rules attached to registered field definitions. The coordinator picks the
//! strategy; this module supplies the shared vocabulary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{path::FieldPath, tree};

/// When validation runs relative to user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Validate only when the form is submitted.
    #[default]
    OnSubmit,
    /// Validate when a field loses focus.
    OnBlur,
    /// Validate on every value change.
    OnChange,
    /// Validate once a field has been touched, then on change.
    OnTouched,
    /// Validate on every trigger.
    All,
}

impl ValidationMode {
    /// True for the submit-only trigger.
    pub fn is_on_submit(&self) -> bool {
        matches!(self, ValidationMode::OnSubmit)
    }

    /// True if this mode fires on value changes.
    pub fn is_on_change(&self) -> bool {
        matches!(self, ValidationMode::OnChange | ValidationMode::All)
    }
}

/// How many failed criteria a single field reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriteriaMode {
    /// Stop at the first failed criterion per field.
    #[default]
    FirstError,
    /// Report every failed criterion.
    All,
}

/// The controller's validation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Trigger mode before the first submission.
    pub mode: ValidationMode,
    /// Trigger mode after the form has been submitted once.
    pub revalidate_mode: ValidationMode,
    /// Criteria reporting mode passed through to field validation.
    pub criteria: CriteriaMode,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            mode: ValidationMode::OnSubmit,
            revalidate_mode: ValidationMode::OnChange,
            criteria: CriteriaMode::FirstError,
        }
    }
}

/// A validation failure for one path, stored as data in the error tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The failed rule or criterion, e.g. `"required"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message for the error-display surface.
    #[serde(default)]
    pub message: String,
}

impl FieldError {
    /// Creates an error from a rule kind and message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The error's representation inside the error tree.
    pub fn into_value(self) -> Value {
        json!({ "type": self.kind, "message": self.message })
    }

    /// Parses an error-tree node back into a `FieldError`.
    ///
    /// Returns `None` for nodes that are not leaf errors (e.g. a per-row
    /// error container).
    pub fn from_value(value: &Value) -> Option<FieldError> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Whether a freshly computed error differs from the recorded one.
///
/// True when kind or message differ, including transitions into or out of
/// "no error". `null` nodes count as "no error", so a cleared entry and a
/// missing entry compare equal.
pub fn error_changed(next: Option<&Value>, previous: Option<&Value>) -> bool {
    let normalize = |v: Option<&Value>| v.filter(|v| !v.is_null());
    normalize(next) != normalize(previous)
}

/// Merges a field-level error for an array path into the error tree,
/// summarizing it as the array's root-level error entry.
///
/// Per-row errors already recorded under the path are preserved as indexed
/// entries beside the `root` entry, so `{"items": [null, {...}]}` becomes
/// `{"items": {"1": {...}, "root": {...}}}`.
pub fn root_error_aggregate(errors: &mut Value, path: &FieldPath, error: FieldError) {
    let mut container = match tree::get(errors, path) {
        Some(Value::Array(rows)) => {
            let mut map = Map::new();
            for (index, row) in rows.iter().enumerate() {
                if !row.is_null() {
                    map.insert(index.to_string(), row.clone());
                }
            }
            map
        }
        // An object without a "type" key is already a per-row container from
        // an earlier aggregation; a leaf error wraps as its first entry.
        Some(Value::Object(map)) if !map.contains_key("type") => map.clone(),
        Some(other) if !other.is_null() => {
            let mut map = Map::new();
            map.insert("0".to_string(), other.clone());
            map
        }
        _ => Map::new(),
    };

    container.insert("root".to_string(), error.into_value());
    tree::set(errors, path, Value::Object(container));
}

/// True when an error tree records no errors at all.
///
/// Empty containers and `null` slots (cleared array positions) count as
/// error-free; any leaf value is an error.
pub fn errors_empty(errors: &Value) -> bool {
    match errors {
        Value::Null => true,
        Value::Object(map) => map.values().all(errors_empty),
        Value::Array(list) => list.iter().all(errors_empty),
        _ => false,
    }
}

/// Result of one schema-resolver evaluation.
#[derive(Debug, Clone, Default)]
pub struct SchemaOutcome {
    /// The (possibly coerced) form values the schema produced.
    pub values: Value,
    /// Error tree for the evaluated paths; empty object when everything
    /// passed.
    pub errors: Value,
}

impl SchemaOutcome {
    /// An outcome with no errors.
    pub fn clean(values: Value) -> Self {
        SchemaOutcome {
            values,
            errors: Value::Object(Map::new()),
        }
    }
}

/// Schema-driven validation evaluating the whole form, or a restricted path
/// subset, in one call.
///
/// Resolution is asynchronous; results arrive on a later task poll, so
/// callers compare against error state re-fetched at arrival time rather
/// than a snapshot captured at dispatch.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Evaluates the schema against `values`, restricted to `paths` when
    /// non-empty.
    async fn resolve(&self, values: Value, paths: &[FieldPath]) -> SchemaOutcome;
}
