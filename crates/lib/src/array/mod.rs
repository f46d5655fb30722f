//! Field arrays: dynamically sized row lists with stable identity.
//!
//! This is the core of the crate, split the way the responsibilities split:
//!
//! - [`ArrayStore`] holds the ordered rows for one array path and the
//!   parallel list of stable identifiers, staying reactive to both local
//!   mutations and controller broadcasts.
//! - [`FieldArray`] is the mutation coordinator: the only writer of
//!   structural changes to its path. It owns identifier lifecycle,
//!   controller propagation, validation dispatch, and focus restoration.
//!
//! Every structural change flows the same way: compute the new ordered list
//! and identifier set, write the list into the controller tagged with an
//! [`ArrayMutation`], update the local store in the same step, then run the
//! re-sync stages (epoch, watcher broadcast, validation, value broadcast,
//! focus, validity, flag clear) in fixed order.

mod field_array;
mod ops;
mod store;

use serde_json::Value;

pub use field_array::{AppendOptions, ArrayOptions, FieldArray, FocusIntent};
pub use ops::{RemoveSelector, RowPayload};
pub use store::ArrayStore;

/// The structural mutation attached to an authoritative list write.
///
/// Carried alongside the new list so the controller's dirty-tracking can
/// distinguish, say, freshly appended rows (not yet dirty) from edited
/// ones.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayMutation {
    /// Rows were inserted.
    Append {
        /// The raw inserted values, as passed by the caller.
        values: Vec<Value>,
        /// The insert position; `None` means the end of the list.
        index: Option<usize>,
    },
    /// Rows were removed.
    Remove {
        /// Which rows were targeted.
        selector: RemoveSelector,
    },
}
