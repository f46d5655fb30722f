//! In-memory reference implementation of the controller contract.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::{ControllerError, FieldDefinition, FormController};
use crate::{
    Result,
    array::ArrayMutation,
    events::{ArrayEvent, StateEvent, ValuesEvent},
    path::FieldPath,
    tree,
    validate::{self, FieldError, Resolver, SchemaOutcome, ValidationConfig},
};

const CHANNEL_CAPACITY: usize = 64;

/// A focus capability attached to a registered field.
type FocusHook = Arc<dyn Fn() + Send + Sync>;

struct RegisteredField {
    definition: FieldDefinition,
    focus: Option<FocusHook>,
}

struct ControllerState {
    values: Value,
    errors: Value,
    arrays: HashSet<FieldPath>,
    // Registration order is part of the contract: focus restoration scans
    // fields first-registered-first.
    fields: Vec<(String, RegisteredField)>,
    watched: HashSet<FieldPath>,
    watch_all: bool,
    submitted: bool,
    epochs: HashMap<FieldPath, u64>,
    last_mutations: HashMap<FieldPath, ArrayMutation>,
    is_valid: bool,
}

/// A complete in-process form controller.
///
/// Holds the authoritative value tree, the error tree, field registrations
/// (with optional focus capabilities), the watched-path set, and the three
/// broadcast subjects. This is the controller the test suite runs against
/// and a usable default for consumers without a controller of their own.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use formic::controller::InMemoryController;
/// use formic::{FieldArray, array::ArrayOptions};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let controller = Arc::new(InMemoryController::new());
/// let items = FieldArray::bind(controller, "items", ArrayOptions::default()).await;
/// assert!(items.entries().is_empty());
/// # });
/// ```
pub struct InMemoryController {
    state: Mutex<ControllerState>,
    array_tx: broadcast::Sender<ArrayEvent>,
    values_tx: broadcast::Sender<ValuesEvent>,
    state_tx: broadcast::Sender<StateEvent>,
    resolver: Option<Arc<dyn Resolver>>,
    config: ValidationConfig,
}

impl Default for InMemoryController {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryController {
    /// Creates a controller with an empty value tree and default
    /// validation configuration.
    pub fn new() -> Self {
        Self::with_values(Value::Object(Map::new()))
    }

    /// Creates a controller with initial form values.
    pub fn with_values(values: Value) -> Self {
        let (array_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (values_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (state_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        InMemoryController {
            state: Mutex::new(ControllerState {
                values,
                errors: Value::Object(Map::new()),
                arrays: HashSet::new(),
                fields: Vec::new(),
                watched: HashSet::new(),
                watch_all: false,
                submitted: false,
                epochs: HashMap::new(),
                last_mutations: HashMap::new(),
                is_valid: true,
            }),
            array_tx,
            values_tx,
            state_tx,
            resolver: None,
            config: ValidationConfig::default(),
        }
    }

    /// Configures a schema resolver, switching validation dispatch to the
    /// resolver strategy.
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Overrides the validation configuration.
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the whole form: new values, cleared errors, and a global
    /// reset broadcast on the array-change subject.
    pub fn reset(&self, values: Value) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            state.values = values;
            state.errors = Value::Object(Map::new());
            state.is_valid = true;
            state.values.clone()
        };
        self.send_array_event(ArrayEvent {
            path: None,
            values: snapshot,
        });
    }

    /// Writes a list at `path` from outside any field array (the analog of
    /// a host application calling `set_value`), broadcasting the change.
    ///
    /// Unlike [`FormController::set_array_values`] this carries no mutation
    /// tag and does not require the path to be registered.
    pub fn write_array(&self, path: &FieldPath, values: Vec<Value>) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            tree::set(&mut state.values, path, Value::Array(values));
            state.values.clone()
        };
        self.send_array_event(ArrayEvent {
            path: Some(path.clone()),
            values: snapshot,
        });
    }

    /// Registers a field carrying a focus capability, as an input widget
    /// would on mount. A re-registered name keeps its original position.
    pub fn register_focusable(
        &self,
        name: impl Into<FieldPath>,
        hook: impl Fn() + Send + Sync + 'static,
    ) {
        let definition = FieldDefinition::new(name);
        let key = definition.name().as_str().to_string();
        let registered = RegisteredField {
            definition,
            focus: Some(Arc::new(hook)),
        };
        let mut state = self.state.lock().unwrap();
        if let Some(index) = state.fields.iter().position(|(name, _)| *name == key) {
            state.fields[index].1 = registered;
        } else {
            state.fields.push((key, registered));
        }
    }

    /// Marks the form as submitted once, enabling re-validation triggers.
    pub fn mark_submitted(&self) {
        self.state.lock().unwrap().submitted = true;
    }

    /// Marks `path` as watched by an external subscriber.
    pub fn watch(&self, path: &FieldPath) {
        self.state.lock().unwrap().watched.insert(path.clone());
    }

    /// Marks every path as watched.
    pub fn watch_all(&self) {
        self.state.lock().unwrap().watch_all = true;
    }

    /// The mutation-tracking epoch recorded for `path`.
    pub fn epoch_of(&self, path: &FieldPath) -> u64 {
        self.state
            .lock()
            .unwrap()
            .epochs
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// The tag of the last structural write to `path`, for downstream
    /// dirty-tracking.
    pub fn last_mutation(&self, path: &FieldPath) -> Option<ArrayMutation> {
        self.state
            .lock()
            .unwrap()
            .last_mutations
            .get(path)
            .cloned()
    }

    /// Overall validity as of the last recomputation.
    pub fn is_valid(&self) -> bool {
        self.state.lock().unwrap().is_valid
    }

    fn send_array_event(&self, event: ArrayEvent) {
        if self.array_tx.send(event).is_err() {
            tracing::trace!("array-change broadcast has no subscribers");
        }
    }
}

#[async_trait]
impl FormController for InMemoryController {
    fn array_values(&self, path: &FieldPath) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        tree::get(&state.values, path)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    fn set_array_values(
        &self,
        path: &FieldPath,
        values: Vec<Value>,
        mutation: &ArrayMutation,
    ) -> Result<()> {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            if !state.arrays.contains(path) {
                return Err(ControllerError::ArrayNotRegistered {
                    path: path.as_str().to_string(),
                }
                .into());
            }
            tree::set(&mut state.values, path, Value::Array(values));
            state.last_mutations.insert(path.clone(), mutation.clone());
            state.values.clone()
        };
        self.send_array_event(ArrayEvent {
            path: Some(path.clone()),
            values: snapshot,
        });
        Ok(())
    }

    fn values_snapshot(&self) -> Value {
        self.state.lock().unwrap().values.clone()
    }

    fn register_array(&self, path: &FieldPath) {
        self.state.lock().unwrap().arrays.insert(path.clone());
    }

    fn deregister_array(&self, path: &FieldPath) {
        self.state.lock().unwrap().arrays.remove(path);
    }

    fn register_field(&self, definition: FieldDefinition) {
        let key = definition.name().as_str().to_string();
        let mut state = self.state.lock().unwrap();
        if let Some(index) = state.fields.iter().position(|(name, _)| *name == key) {
            state.fields[index].1.definition = definition;
        } else {
            state.fields.push((
                key,
                RegisteredField {
                    definition,
                    focus: None,
                },
            ));
        }
    }

    fn subscribe_array_changes(&self) -> broadcast::Receiver<ArrayEvent> {
        self.array_tx.subscribe()
    }

    fn subscribe_values(&self) -> broadcast::Receiver<ValuesEvent> {
        self.values_tx.subscribe()
    }

    fn subscribe_state(&self) -> broadcast::Receiver<StateEvent> {
        self.state_tx.subscribe()
    }

    fn publish_values(&self, path: Option<&FieldPath>) {
        let values = self.values_snapshot();
        let event = ValuesEvent {
            path: path.cloned(),
            values,
        };
        if self.values_tx.send(event).is_err() {
            tracing::trace!("values broadcast has no subscribers");
        }
    }

    fn publish_form_state(&self) {
        let event = {
            let state = self.state.lock().unwrap();
            StateEvent {
                errors: state.errors.clone(),
                is_valid: state.is_valid,
            }
        };
        if self.state_tx.send(event).is_err() {
            tracing::trace!("state broadcast has no subscribers");
        }
    }

    fn validation_config(&self) -> ValidationConfig {
        self.config
    }

    fn is_submitted(&self) -> bool {
        self.state.lock().unwrap().submitted
    }

    fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    async fn run_schema_validation(&self, paths: &[FieldPath]) -> SchemaOutcome {
        let values = self.values_snapshot();
        match &self.resolver {
            Some(resolver) => resolver.resolve(values, paths).await,
            None => SchemaOutcome::clean(values),
        }
    }

    fn field(&self, path: &FieldPath) -> Option<FieldDefinition> {
        let state = self.state.lock().unwrap();
        state
            .fields
            .iter()
            .find(|(name, _)| name.as_str() == path.as_str())
            .map(|(_, field)| field.definition.clone())
    }

    async fn run_field_validation(
        &self,
        definition: &FieldDefinition,
        values: &Value,
        _report_all: bool,
    ) -> Option<FieldError> {
        let rule = definition.rule()?;
        let value = tree::get(values, definition.name())
            .cloned()
            .unwrap_or(Value::Null);
        rule(&value)
    }

    fn recompute_validity(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.is_valid = validate::errors_empty(&state.errors);
        }
        self.publish_form_state();
    }

    fn errors_snapshot(&self) -> Value {
        self.state.lock().unwrap().errors.clone()
    }

    fn set_errors(&self, errors: Value) {
        self.state.lock().unwrap().errors = errors;
    }

    fn note_structural_change(&self, path: &FieldPath) {
        let mut state = self.state.lock().unwrap();
        *state.epochs.entry(path.clone()).or_insert(0) += 1;
    }

    fn is_watched(&self, path: &FieldPath) -> bool {
        let state = self.state.lock().unwrap();
        state.watch_all || state.watched.contains(path)
    }

    fn field_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    fn try_focus(&self, name: &str) -> bool {
        let hook = {
            let state = self.state.lock().unwrap();
            state
                .fields
                .iter()
                .find(|(field_name, _)| field_name.as_str() == name)
                .and_then(|(_, field)| field.focus.clone())
        };
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}
