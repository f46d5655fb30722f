//! The mutation coordinator for one field array.

use std::sync::Arc;

use serde_json::Value;

use super::{
    ArrayMutation,
    ops::{self, RemoveSelector, RowPayload},
    store::ArrayStore,
};
use crate::{
    Result,
    controller::{FieldDefinition, FieldRule, FormController},
    entry::{RowEntry, RowId},
    events::ArrayEvent,
    path::FieldPath,
    tree,
    validate::{self, CriteriaMode, FieldError, ValidationConfig},
};

/// Options applied when binding a [`FieldArray`] to a controller.
#[derive(Default)]
pub struct ArrayOptions {
    rule: Option<Arc<FieldRule>>,
}

impl ArrayOptions {
    /// No rules, default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the array root itself as a field carrying this rule, so
    /// per-field validation can constrain the array as a whole (e.g. a
    /// minimum row count).
    pub fn with_rule(
        mut self,
        rule: impl Fn(&Value) -> Option<FieldError> + Send + Sync + 'static,
    ) -> Self {
        self.rule = Some(Arc::new(rule));
        self
    }
}

/// Where focus should land after an append.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FocusIntent {
    /// Focus the first focusable field of the appended row.
    #[default]
    NewRow,
    /// Focus the appended row's field with this name.
    Field(String),
    /// Do not move focus.
    Suppress,
}

/// Options for one append call.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Insert position; rows go at the end when unset. Clamped to the list
    /// length.
    pub index: Option<usize>,
    /// Focus behavior once the re-sync step runs.
    pub focus: FocusIntent,
}

impl AppendOptions {
    /// Appends at `index` instead of the end.
    pub fn at(index: usize) -> Self {
        AppendOptions {
            index: Some(index),
            ..Default::default()
        }
    }

    /// Focuses the new row's field named `field`.
    pub fn focus_field(field: impl Into<String>) -> Self {
        AppendOptions {
            focus: FocusIntent::Field(field.into()),
            ..Default::default()
        }
    }

    /// Leaves focus where it is.
    pub fn without_focus() -> Self {
        AppendOptions {
            focus: FocusIntent::Suppress,
            ..Default::default()
        }
    }
}

/// Coordinator for one dynamically sized field array.
///
/// `FieldArray` is the only writer of structural changes to its array path.
/// It owns the identifier lifecycle, propagates every mutation to the
/// controller's authoritative store, re-derives its local list from
/// controller broadcasts, and runs the post-mutation re-sync step that
/// dispatches validation and restores input focus.
///
/// Mutations are atomic from the caller's point of view: the local list and
/// the controller's list reflect the same ordered rows before the first
/// await point of [`append`](FieldArray::append) or
/// [`remove`](FieldArray::remove). Broadcast delivery to other observers and
/// validation outcomes may arrive later.
///
/// Inbound broadcasts are not pulled automatically; the consuming event
/// loop subscribes via
/// [`FormController::subscribe_array_changes`] and feeds events to
/// [`handle_event`](FieldArray::handle_event).
pub struct FieldArray {
    path: FieldPath,
    controller: Arc<dyn FormController>,
    store: ArrayStore,
    actioned: bool,
    pending_focus: Option<String>,
}

impl FieldArray {
    /// Binds a field array to `path` on `controller`.
    ///
    /// Registers the path, registers the array root as a field when
    /// [`ArrayOptions`] carry a rule, initializes the local list from the
    /// controller's current value, and runs the initial re-sync step.
    pub async fn bind(
        controller: Arc<dyn FormController>,
        path: impl Into<FieldPath>,
        options: ArrayOptions,
    ) -> Self {
        let path = path.into();
        controller.register_array(&path);
        if let Some(rule) = options.rule {
            controller.register_field(FieldDefinition::new(path.clone()).with_shared_rule(rule));
        }
        let store = ArrayStore::initialize(path.clone(), controller.as_ref());
        let mut array = FieldArray {
            path,
            controller,
            store,
            actioned: false,
            pending_focus: None,
        };
        array.resync().await;
        array
    }

    /// The array path this coordinator owns.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// The current rows with their stable identifiers, in order.
    pub fn entries(&self) -> Vec<RowEntry> {
        self.store.entries()
    }

    /// The identifiers in row order.
    pub fn ids(&self) -> &[RowId] {
        self.store.ids()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True when the list has no rows.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// True while a local mutation awaits its re-sync step.
    pub fn action_pending(&self) -> bool {
        self.actioned
    }

    /// Appends one row or an ordered batch of rows.
    ///
    /// Each inserted row receives a fresh identifier; existing rows keep
    /// theirs. The new list is written to the controller tagged as an
    /// append (carrying the raw inserted values for dirty-tracking), the
    /// local list is updated in the same step, and the re-sync step then
    /// validates and restores focus as configured.
    ///
    /// # Errors
    /// Only controller-contract misuse surfaces here
    /// ([`ControllerError`](crate::controller::ControllerError)); validation
    /// failures are data in the error tree, never an `Err`.
    pub async fn append(
        &mut self,
        rows: impl Into<RowPayload>,
        options: AppendOptions,
    ) -> Result<()> {
        let rows = rows.into().into_rows();
        let current = self.controller.array_values(&self.path);
        let index = options.index.map(|index| index.min(current.len()));

        let updated = ops::insert_items(current, index, rows.clone());
        let fresh: Vec<RowId> = rows.iter().map(|_| RowId::generate()).collect();
        let ids = ops::insert_items(self.store.ids().to_vec(), index, fresh);

        let focus_row = index.unwrap_or(updated.len().saturating_sub(1));
        self.pending_focus = match options.focus {
            FocusIntent::NewRow => Some(self.path.row_prefix(focus_row)),
            FocusIntent::Field(field) => Some(format!("{}{field}", self.path.row_prefix(focus_row))),
            FocusIntent::Suppress => None,
        };

        self.actioned = true;
        tracing::debug!(path = %self.path, rows = updated.len(), "append to field array");
        self.controller.set_array_values(
            &self.path,
            updated.clone(),
            &ArrayMutation::Append {
                values: rows,
                index,
            },
        )?;
        self.store.replace(updated, ids);

        self.resync().await;
        Ok(())
    }

    /// Removes the selected rows, shifting the remainder down.
    ///
    /// Out-of-range indices are ignored. Removing
    /// [`RemoveSelector::All`] leaves an empty list at the path, which
    /// stays distinct from the path not existing at all.
    ///
    /// # Errors
    /// As for [`append`](FieldArray::append).
    pub async fn remove(&mut self, selector: impl Into<RemoveSelector>) -> Result<()> {
        let selector = selector.into();
        let current = self.controller.array_values(&self.path);

        let updated = ops::remove_items(current, &selector);
        let ids = ops::remove_items(self.store.ids().to_vec(), &selector);

        self.actioned = true;
        tracing::debug!(path = %self.path, rows = updated.len(), "remove from field array");
        self.controller.set_array_values(
            &self.path,
            updated.clone(),
            &ArrayMutation::Remove { selector },
        )?;
        self.store.replace(updated, ids);

        self.resync().await;
        Ok(())
    }

    /// Removes every row. Equivalent to `remove(RemoveSelector::All)`.
    pub async fn remove_all(&mut self) -> Result<()> {
        self.remove(RemoveSelector::All).await
    }

    /// Feeds one array-change broadcast from the controller.
    ///
    /// Events for other paths and non-array payloads are ignored; an
    /// accepted event replaces the local list and runs the re-sync step.
    pub async fn handle_event(&mut self, event: &ArrayEvent) {
        if self.store.apply_broadcast(event) {
            tracing::debug!(path = %self.path, rows = self.store.len(), "re-derived field array from broadcast");
            self.resync().await;
        }
    }

    /// The reactive re-sync step, run after bind and after every local or
    /// external structural change. Stages run in fixed order; validation is
    /// the only asynchronous one.
    async fn resync(&mut self) {
        // propagate-epoch
        self.controller.note_structural_change(&self.path);

        // broadcast-watch
        if self.controller.is_watched(&self.path) {
            tracing::trace!(path = %self.path, "publishing snapshot for watchers");
            self.controller.publish_values(None);
        }

        // validate-if-needed
        let config = self.controller.validation_config();
        let should_validate =
            self.actioned && (!config.mode.is_on_submit() || self.controller.is_submitted());
        if should_validate {
            self.dispatch_validation(config).await;
        }

        // broadcast-values
        self.controller.publish_values(Some(&self.path));

        // restore-focus
        if let Some(target) = self.pending_focus.take() {
            self.restore_focus(&target);
        }

        // recompute-validity
        self.controller.recompute_validity();

        // clear-flag
        self.actioned = false;
    }

    fn restore_focus(&self, target: &str) {
        for name in self.controller.field_names() {
            if name.starts_with(target) && self.controller.try_focus(&name) {
                return;
            }
        }
        tracing::trace!(path = %self.path, target, "no focusable field matched");
    }

    /// Dispatches validation using the resolver strategy when the
    /// controller has a schema resolver, the per-field strategy otherwise.
    ///
    /// Both strategies compare against controller error state re-fetched
    /// after the asynchronous hop, so a result that no longer differs from
    /// the state current at arrival time is discarded.
    async fn dispatch_validation(&self, config: ValidationConfig) {
        if self.controller.has_resolver() {
            let outcome = self
                .controller
                .run_schema_validation(std::slice::from_ref(&self.path))
                .await;
            let next = tree::get(&outcome.errors, &self.path)
                .filter(|error| !error.is_null())
                .cloned();

            let previous = self.controller.error_tree_at(&self.path);
            if !validate::error_changed(next.as_ref(), previous.as_ref()) {
                return;
            }

            let mut errors = self.controller.errors_snapshot();
            match next {
                Some(error) => tree::set(&mut errors, &self.path, error),
                None => tree::unset(&mut errors, &self.path),
            }
            self.controller.set_errors(errors);
            self.controller.publish_form_state();
        } else if let Some(definition) = self.controller.field(&self.path) {
            if config.mode.is_on_submit() && config.revalidate_mode.is_on_submit() {
                return;
            }
            let values = self.controller.values_snapshot();
            let report_all = config.criteria == CriteriaMode::All;
            if let Some(error) = self
                .controller
                .run_field_validation(&definition, &values, report_all)
                .await
            {
                let mut errors = self.controller.errors_snapshot();
                validate::root_error_aggregate(&mut errors, &self.path, error);
                self.controller.set_errors(errors);
                self.controller.publish_form_state();
            }
        }
    }
}

impl Drop for FieldArray {
    fn drop(&mut self) {
        self.controller.deregister_array(&self.path);
    }
}
