//! Broadcast payloads published by the form controller.
//!
//! The controller owns three broadcast subjects, each carrying one of the
//! payload types here. Shape checks happen at this boundary: an event either
//! is an [`ArrayEvent`] for some path or it is not, so downstream code
//! pattern-matches instead of probing arbitrary values.

use serde_json::Value;

use crate::path::FieldPath;

/// An array-structural change to the authoritative value tree.
///
/// Delivered to every field-array subscriber; each one ignores events whose
/// `path` names a different array.
#[derive(Debug, Clone)]
pub struct ArrayEvent {
    /// The array path whose list changed. `None` means the whole form was
    /// replaced (e.g. a reset) and every array should re-derive its list.
    pub path: Option<FieldPath>,
    /// The full form value tree after the change.
    pub values: Value,
}

/// A whole-form value snapshot, emitted so dependent computed values and
/// watchers recompute.
#[derive(Debug, Clone)]
pub struct ValuesEvent {
    /// The path whose mutation triggered the snapshot, if any.
    pub path: Option<FieldPath>,
    /// The full form value tree.
    pub values: Value,
}

/// A form-state snapshot: the error map and overall validity.
#[derive(Debug, Clone)]
pub struct StateEvent {
    /// The full error tree.
    pub errors: Value,
    /// Whether the form currently has no errors.
    pub is_valid: bool,
}
