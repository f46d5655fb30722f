//! Row identity for field arrays.
//!
//! Every row in a field array carries a [`RowId`]: a synthetic identifier
//! generated once when the row enters the list and never derived from the
//! row's data. The identifier follows the row through appends, removals,
//! and reorders, which is what lets a consuming UI key its rendered rows by
//! something stable while values churn underneath.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable synthetic identifier for one logical row of a field array.
///
/// Generated as a UUIDv4, so identifiers are collision-free across arrays
/// without any coordination. A `RowId` is never reused: removing a row
/// retires its identifier, and re-appending equal data yields a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        RowId(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One row of a field array as seen by the consuming UI.
///
/// Pairs the stable identifier with the row's current data payload. Row
/// data is typically an object (`{"name": "x"}`), but any array-shaped
/// authoritative value is carried through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowEntry {
    /// The row's stable identity. Key rendered rows by this, never by index.
    pub id: RowId,
    /// The row's current value payload.
    pub data: Value,
}
