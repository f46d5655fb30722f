//! The form-controller contract consumed by field arrays.
//!
//! The central form controller owns the authoritative value tree, the error
//! map, field registrations, and the broadcast subjects that fan state out
//! to observers. A field array never reaches into that state directly; it
//! consumes the [`FormController`] trait, which exposes only the operations
//! the array actually needs: list read/write, registration, the broadcast
//! subjects, validation entry points, and focus lookup.
//!
//! [`InMemoryController`] is the reference implementation, used by the test
//! suite and by consumers that do not bring their own controller.

pub mod errors;
mod in_memory;

use std::{fmt, sync::Arc};

pub use errors::ControllerError;
pub use in_memory::InMemoryController;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    Result,
    array::ArrayMutation,
    events::{ArrayEvent, StateEvent, ValuesEvent},
    path::FieldPath,
    tree,
    validate::{FieldError, SchemaOutcome, ValidationConfig},
};

/// A field-level validation rule.
///
/// Receives the field's current value (or `Value::Null` when absent) and
/// returns the failure, if any. Rule semantics belong to the validator; the
/// core only transports the result.
pub type FieldRule = dyn Fn(&Value) -> Option<FieldError> + Send + Sync;

/// Metadata for one registered field reference.
#[derive(Clone)]
pub struct FieldDefinition {
    name: FieldPath,
    rule: Option<Arc<FieldRule>>,
}

impl FieldDefinition {
    /// Creates a definition for the field at `name`.
    pub fn new(name: impl Into<FieldPath>) -> Self {
        FieldDefinition {
            name: name.into(),
            rule: None,
        }
    }

    /// Attaches a validation rule.
    pub fn with_rule(
        self,
        rule: impl Fn(&Value) -> Option<FieldError> + Send + Sync + 'static,
    ) -> Self {
        self.with_shared_rule(Arc::new(rule))
    }

    /// Attaches an already-shared validation rule.
    pub fn with_shared_rule(mut self, rule: Arc<FieldRule>) -> Self {
        self.rule = Some(rule);
        self
    }

    /// The field's path within the value tree.
    pub fn name(&self) -> &FieldPath {
        &self.name
    }

    /// The attached rule, if any.
    pub fn rule(&self) -> Option<&Arc<FieldRule>> {
        self.rule.as_ref()
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("has_rule", &self.rule.is_some())
            .finish()
    }
}

/// The contract a form controller exposes to field arrays.
///
/// Implementations must be shareable across the arrays bound to them
/// (`Send + Sync`); the single-writer-per-path convention means only one
/// coordinator issues structural writes for any given array path.
///
/// Only validation is asynchronous. Structural reads and writes complete
/// synchronously so a mutation can leave local and authoritative state
/// consistent before its caller observes either.
#[async_trait]
pub trait FormController: Send + Sync {
    // --- Authoritative value tree ---

    /// The current authoritative list at `path`.
    ///
    /// Returns an empty list when the path is absent or holds a non-array
    /// value.
    fn array_values(&self, path: &FieldPath) -> Vec<Value>;

    /// Replaces the authoritative list at `path` and notifies the
    /// array-change subject.
    ///
    /// The mutation tag describes what produced the new list so downstream
    /// dirty-tracking can, for example, treat newly appended rows as
    /// not-yet-dirty.
    ///
    /// # Errors
    /// Returns [`ControllerError::ArrayNotRegistered`] if `path` was never
    /// registered.
    fn set_array_values(
        &self,
        path: &FieldPath,
        values: Vec<Value>,
        mutation: &ArrayMutation,
    ) -> Result<()>;

    /// A clone of the full form value tree.
    fn values_snapshot(&self) -> Value;

    // --- Registration ---

    /// Registers `path` as a field array. Idempotent.
    fn register_array(&self, path: &FieldPath);

    /// Removes the registration on teardown.
    fn deregister_array(&self, path: &FieldPath);

    /// Registers a field reference (the array root itself, when bound with
    /// rules). An existing registration for the same name keeps its focus
    /// capability.
    fn register_field(&self, definition: FieldDefinition);

    // --- Broadcast subjects ---

    /// Subscribes to array-structural changes.
    fn subscribe_array_changes(&self) -> broadcast::Receiver<ArrayEvent>;

    /// Subscribes to whole-form value snapshots.
    fn subscribe_values(&self) -> broadcast::Receiver<ValuesEvent>;

    /// Subscribes to form-state snapshots (errors and validity).
    fn subscribe_state(&self) -> broadcast::Receiver<StateEvent>;

    /// Broadcasts the current full value snapshot, optionally tagged with
    /// the path whose mutation produced it.
    fn publish_values(&self, path: Option<&FieldPath>);

    /// Broadcasts the current form state (error tree and validity).
    fn publish_form_state(&self);

    // --- Validation ---

    /// The configured trigger and criteria modes.
    fn validation_config(&self) -> ValidationConfig;

    /// Whether the form has been submitted at least once.
    fn is_submitted(&self) -> bool;

    /// Whether a schema resolver is configured. Selects the validation
    /// dispatch strategy.
    fn has_resolver(&self) -> bool;

    /// Runs the schema resolver restricted to `paths`.
    ///
    /// With no resolver configured this resolves clean; callers gate on
    /// [`has_resolver`](FormController::has_resolver) first.
    async fn run_schema_validation(&self, paths: &[FieldPath]) -> SchemaOutcome;

    /// Looks up the registered field definition for `path`.
    fn field(&self, path: &FieldPath) -> Option<FieldDefinition>;

    /// Runs field-level validation for `definition` against `values`.
    ///
    /// `report_all` requests every failed criterion rather than the first.
    /// Resolves `None` when the field has no rule or the rule passes.
    async fn run_field_validation(
        &self,
        definition: &FieldDefinition,
        values: &Value,
        report_all: bool,
    ) -> Option<FieldError>;

    /// Recomputes overall form validity from the error tree and broadcasts
    /// it on the state subject.
    fn recompute_validity(&self);

    // --- Error map ---

    /// A clone of the full error tree.
    fn errors_snapshot(&self) -> Value;

    /// Replaces the full error tree.
    fn set_errors(&self, errors: Value);

    /// The error subtree recorded at `path`, if any.
    fn error_tree_at(&self, path: &FieldPath) -> Option<Value> {
        tree::get(&self.errors_snapshot(), path).cloned()
    }

    // --- Bookkeeping ---

    /// Bumps the mutation-tracking epoch for `path` so dependent
    /// global-state listeners observe the structural change.
    fn note_structural_change(&self, path: &FieldPath);

    /// Whether any external subscriber watches `path`.
    fn is_watched(&self, path: &FieldPath) -> bool;

    // --- Focus ---

    /// The names of all registered field references, in registration order.
    ///
    /// Focus restoration scans this list front to back, so the first
    /// registered field that prefix-matches a focus target wins.
    fn field_names(&self) -> Vec<String>;

    /// Invokes the focus capability of the field registered as `name`.
    ///
    /// Returns `false` when the field is unknown or has no focus
    /// capability, so callers can keep scanning for a focusable match.
    fn try_focus(&self, name: &str) -> bool;
}
