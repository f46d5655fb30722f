//! Path-addressed access into JSON value trees.
//!
//! The form's values and its error map are both nested [`serde_json::Value`]
//! trees addressed by [`FieldPath`]. This module provides the read/write
//! primitives the rest of the crate builds on: [`get`], [`set`], and
//! [`unset`].
//!
//! Numeric components address array elements; everything else addresses
//! object keys. [`set`] materializes missing intermediate containers, picking
//! an array when the next component is numeric and an object otherwise, so
//! `set(root, "items.0.name", v)` builds `{"items": [{"name": v}]}` from an
//! empty tree.

use serde_json::{Map, Value};

use crate::path::FieldPath;

/// Reads the value at `path`, if present.
///
/// The empty path refers to `root` itself. Returns `None` when any component
/// is missing, out of range, or addresses into a scalar.
pub fn get<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut node = root;
    for component in path.components() {
        node = match node {
            Value::Object(map) => map.get(component)?,
            Value::Array(list) => list.get(component.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Writes `value` at `path`, materializing intermediate containers.
///
/// Containers along the way are reshaped as needed: a numeric component
/// turns a scalar into an array (filling skipped indices with `null`), any
/// other component turns it into an object. A non-numeric component applied
/// to an existing array replaces the array with an object.
pub fn set(root: &mut Value, path: &FieldPath, value: Value) {
    let components: Vec<&str> = path.components().collect();
    if components.is_empty() {
        *root = value;
        return;
    }
    set_at(root, &components, value);
}

fn set_at(node: &mut Value, components: &[&str], value: Value) {
    let component = components[0];
    let index = component.parse::<usize>().ok();

    // Reshape the node so the leading component can be addressed into it.
    match (&mut *node, index) {
        (Value::Object(_), _) => {}
        (Value::Array(_), Some(_)) => {}
        (_, Some(_)) => *node = Value::Array(Vec::new()),
        (_, None) => *node = Value::Object(Map::new()),
    }

    match (node, index) {
        (Value::Array(list), Some(i)) => {
            while list.len() <= i {
                list.push(Value::Null);
            }
            if components.len() == 1 {
                list[i] = value;
            } else {
                set_at(&mut list[i], &components[1..], value);
            }
        }
        (Value::Object(map), _) => {
            if components.len() == 1 {
                map.insert(component.to_string(), value);
            } else {
                let child = map.entry(component.to_string()).or_insert(Value::Null);
                set_at(child, &components[1..], value);
            }
        }
        _ => {}
    }
}

/// Removes the value at `path`, if present.
///
/// Object entries are removed outright. Array elements are replaced with
/// `null` so the positions of sibling rows are preserved. Unsetting the
/// empty path or a missing location is a no-op.
pub fn unset(root: &mut Value, path: &FieldPath) {
    let components: Vec<&str> = path.components().collect();
    let Some((last, parents)) = components.split_last() else {
        return;
    };

    let mut node = root;
    for component in parents {
        node = match node {
            Value::Object(map) => match map.get_mut(*component) {
                Some(child) => child,
                None => return,
            },
            Value::Array(list) => {
                let Ok(index) = component.parse::<usize>() else {
                    return;
                };
                match list.get_mut(index) {
                    Some(child) => child,
                    None => return,
                }
            }
            _ => return,
        };
    }

    match node {
        Value::Object(map) => {
            map.remove(*last);
        }
        Value::Array(list) => {
            if let Ok(index) = last.parse::<usize>()
                && let Some(slot) = list.get_mut(index)
            {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}
