//! The local row store backing one field array.

use serde_json::Value;

use crate::{
    controller::FormController,
    entry::{RowEntry, RowId},
    events::ArrayEvent,
    path::FieldPath,
    tree,
};

/// Ordered row values for one array path, paired with the parallel list of
/// stable identifiers.
///
/// The store is the array's render source: after every accepted mutation or
/// broadcast, [`entries`](ArrayStore::entries) yields the rows the UI should
/// show, keyed by identifiers that survive value churn.
///
/// The two lists always have equal length and index alignment; every
/// mutation path goes through [`replace`](ArrayStore::replace) or
/// [`apply_broadcast`](ArrayStore::apply_broadcast), which maintain that
/// invariant.
#[derive(Debug)]
pub struct ArrayStore {
    path: FieldPath,
    entries: Vec<Value>,
    ids: Vec<RowId>,
}

impl ArrayStore {
    /// Reads the controller's current list for `path` as the initial state,
    /// assigning a fresh identifier per existing row. An absent or
    /// non-array value yields an empty store.
    pub(crate) fn initialize(path: FieldPath, controller: &dyn FormController) -> Self {
        let entries = controller.array_values(&path);
        let ids = entries.iter().map(|_| RowId::generate()).collect();
        ArrayStore { path, entries, ids }
    }

    /// The array path this store mirrors.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Number of rows currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the list is empty (which is still distinct from the path
    /// being absent in the controller).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The identifiers in row order.
    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }

    /// The current rows, each paired with its stable identifier.
    pub fn entries(&self) -> Vec<RowEntry> {
        self.ids
            .iter()
            .zip(&self.entries)
            .map(|(id, data)| RowEntry {
                id: id.clone(),
                data: data.clone(),
            })
            .collect()
    }

    /// Replaces both lists after a local mutation.
    ///
    /// The identifier list is realigned to the entry count as a safety net:
    /// surplus identifiers are dropped, missing ones generated fresh.
    pub(crate) fn replace(&mut self, entries: Vec<Value>, ids: Vec<RowId>) {
        self.entries = entries;
        self.ids = ids;
        self.align_ids();
    }

    /// Applies an array-change broadcast.
    ///
    /// Accepts the event when it names this store's path (or no path at
    /// all, a global reset) and the value at the path is array-shaped; the
    /// local list is then replaced wholesale. Identifiers already held are
    /// kept positionally and fresh ones are assigned only to rows beyond
    /// them, so replaying an identical broadcast changes nothing.
    ///
    /// Returns whether the event was accepted. Events for other paths and
    /// non-array payloads are ignored.
    pub(crate) fn apply_broadcast(&mut self, event: &ArrayEvent) -> bool {
        if let Some(changed) = &event.path
            && changed != &self.path
        {
            return false;
        }
        let Some(values) = tree::get(&event.values, &self.path).and_then(Value::as_array) else {
            return false;
        };
        self.entries = values.clone();
        self.align_ids();
        true
    }

    fn align_ids(&mut self) {
        self.ids.truncate(self.entries.len());
        while self.ids.len() < self.entries.len() {
            self.ids.push(RowId::generate());
        }
    }
}
