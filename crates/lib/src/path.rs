//! Path types for addressing fields within the form value tree.
//!
//! A [`FieldPath`] names one location in the nested form value tree, such as
//! a field array (`"items"`), one of its rows (`"items.0"`), or a field of a
//! row (`"items.0.name"`). Paths are stored in normalized dotted form;
//! bracket subscripts are accepted on input and normalized away.
//!
//! # Usage
//!
//! ```rust
//! use formic::path::FieldPath;
//!
//! // Construct from a string (automatically normalized)
//! let path = FieldPath::new("items[0].name");
//! assert_eq!(path.as_str(), "items.0.name");
//!
//! // Build incrementally
//! let row = FieldPath::new("items").index_child(2);
//! assert_eq!(row.as_str(), "items.2");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for path component validation failures.
///
/// Most path construction is infallible through normalization; this error
/// only arises when a single component is checked on its own.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Invalid component: components cannot contain separators.
    #[error("Invalid component '{component}': {reason}")]
    InvalidComponent { component: String, reason: String },
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

/// Normalizes a path string into dotted form.
///
/// - Bracket subscripts become dotted components: `"items[0].name"` → `"items.0.name"`
/// - Leading, trailing, and consecutive dots are dropped: `"items..0."` → `"items.0"`
/// - The empty string refers to the whole value tree
///
/// # Examples
///
/// ```rust
/// # use formic::path::normalize_path;
/// assert_eq!(normalize_path(""), "");
/// assert_eq!(normalize_path("items[0].name"), "items.0.name");
/// assert_eq!(normalize_path(".items."), "items");
/// assert_eq!(normalize_path("items..0"), "items.0");
/// ```
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .replace('[', ".")
        .replace(']', "")
        .split('.')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// A normalized path into the form value tree.
///
/// `FieldPath` identifies a field array, a row, or a row's field within the
/// controller's value tree. Construction normalizes the input, so two paths
/// that name the same location compare equal regardless of how they were
/// spelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath {
    inner: String,
}

impl FieldPath {
    /// Creates a path from any string form, normalizing it.
    pub fn new(path: impl AsRef<str>) -> Self {
        FieldPath {
            inner: normalize_path(path.as_ref()),
        }
    }

    /// Returns the normalized dotted form of the path.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// True for the empty path, which refers to the whole value tree.
    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates the dotted components of the path, in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('.').filter(|c| !c.is_empty())
    }

    /// Appends a validated component.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidComponent`] if the component contains a
    /// dot or bracket, which would silently split it into several components.
    pub fn child(&self, component: impl AsRef<str>) -> Result<Self, PathError> {
        let component = component.as_ref();
        if component.contains(['.', '[', ']']) {
            return Err(PathError::InvalidComponent {
                component: component.to_string(),
                reason: "components cannot contain separators".to_string(),
            });
        }
        Ok(self.join(component))
    }

    /// Appends a numeric row component: `"items"` → `"items.2"`.
    pub fn index_child(&self, index: usize) -> Self {
        self.join(&index.to_string())
    }

    /// The focus-target prefix for one row of this array: `"items.2."`.
    ///
    /// A registered field name like `"items.2.name"` starts with this prefix,
    /// so prefix matching finds the row's first focusable field.
    pub fn row_prefix(&self, index: usize) -> String {
        format!("{}.{index}.", self.inner)
    }

    /// True if `self` names `prefix` itself or a location beneath it.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.inner.strip_prefix(&prefix.inner) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }

    fn join(&self, component: &str) -> Self {
        if self.inner.is_empty() {
            FieldPath {
                inner: component.to_string(),
            }
        } else {
            FieldPath {
                inner: format!("{}.{component}", self.inner),
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::new(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::new(s)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}
