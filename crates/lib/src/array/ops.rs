//! Pure list algebra shared by the store and the coordinator.
//!
//! These operate on plain vectors so the same code manipulates row values
//! and their parallel identifier list, which is what keeps the two aligned
//! index-for-index through every mutation.

use serde_json::{Map, Value};

/// The rows handed to an append call: one row or an ordered batch.
///
/// Mirrors the payload shapes a form accepts: a single row object, a raw
/// `Value` (an array value counts as a batch), or an explicit vector.
#[derive(Debug, Clone)]
pub struct RowPayload(Vec<Value>);

impl RowPayload {
    pub(crate) fn into_rows(self) -> Vec<Value> {
        self.0
    }
}

impl From<Value> for RowPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(rows) => RowPayload(rows),
            other => RowPayload(vec![other]),
        }
    }
}

impl From<Vec<Value>> for RowPayload {
    fn from(rows: Vec<Value>) -> Self {
        RowPayload(rows)
    }
}

impl From<Map<String, Value>> for RowPayload {
    fn from(row: Map<String, Value>) -> Self {
        RowPayload(vec![Value::Object(row)])
    }
}

impl From<Vec<Map<String, Value>>> for RowPayload {
    fn from(rows: Vec<Map<String, Value>>) -> Self {
        RowPayload(rows.into_iter().map(Value::Object).collect())
    }
}

/// Which rows a remove call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveSelector {
    /// Remove every row, leaving an empty list (not an absent one).
    All,
    /// Remove the rows at these positions; out-of-range indices are
    /// ignored.
    Indices(Vec<usize>),
}

impl From<usize> for RemoveSelector {
    fn from(index: usize) -> Self {
        RemoveSelector::Indices(vec![index])
    }
}

impl From<Vec<usize>> for RemoveSelector {
    fn from(indices: Vec<usize>) -> Self {
        RemoveSelector::Indices(indices)
    }
}

impl From<&[usize]> for RemoveSelector {
    fn from(indices: &[usize]) -> Self {
        RemoveSelector::Indices(indices.to_vec())
    }
}

/// Inserts `items` at `index` (clamped to the list length), or at the end
/// when no index is given.
pub(crate) fn insert_items<T>(mut list: Vec<T>, index: Option<usize>, items: Vec<T>) -> Vec<T> {
    let at = index.unwrap_or(list.len()).min(list.len());
    list.splice(at..at, items);
    list
}

/// Removes the selected rows, shifting the remainder down in original
/// relative order.
pub(crate) fn remove_items<T>(list: Vec<T>, selector: &RemoveSelector) -> Vec<T> {
    match selector {
        RemoveSelector::All => Vec::new(),
        RemoveSelector::Indices(indices) => {
            let mut sorted: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|index| *index < list.len())
                .collect();
            sorted.sort_unstable();
            sorted.dedup();
            list.into_iter()
                .enumerate()
                .filter(|(index, _)| sorted.binary_search(index).is_err())
                .map(|(_, item)| item)
                .collect()
        }
    }
}
