//!
//! Formic: headless form state for dynamic field arrays.
//! This library keeps a growable list of form rows synchronized with a
//! central form controller while every row keeps a stable identity across
//! mutations and re-renders.
//!
//! ## Core Concepts
//!
//! * **Field arrays (`array::FieldArray`)**: the mutation coordinator for one array path. Appends and removes rows, propagates every change to the controller, and runs the post-mutation re-sync step (validation, focus restoration, broadcasts).
//! * **Row identity (`entry::RowId`)**: a synthetic identifier generated once per logical row, never derived from row data. UIs key rendered rows by it instead of by index.
//! * **Paths (`path::FieldPath`)**: dotted/bracketed names addressing arrays, rows, and fields within the form value tree (`"items"`, `"items.0.name"`).
//! * **The controller contract (`controller::FormController`)**: the narrow interface a form controller exposes to field arrays; `controller::InMemoryController` is the reference implementation.
//! * **Broadcast subjects (`events`)**: tagged payloads for array-structural changes, value snapshots, and form-state updates, carried over `tokio` broadcast channels.
//! * **Validation as data (`validate`)**: failures are `FieldError` values merged into the controller's error tree and broadcast to the UI; they never surface as `Err` from a mutation.

pub mod array;
pub mod controller;
pub mod entry;
pub mod events;
pub mod path;
pub mod tree;
pub mod validate;

/// Re-export the `FieldArray` coordinator for easier access.
pub use array::FieldArray;

/// Result type used throughout the formic library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the formic library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured path errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured controller errors from the controller module
    #[error(transparent)]
    Controller(controller::ControllerError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::Controller(_) => "controller",
        }
    }

    /// Check if this error indicates a missing array registration.
    pub fn is_not_registered(&self) -> bool {
        match self {
            Error::Controller(controller_err) => controller_err.is_not_registered(),
            _ => false,
        }
    }

    /// Check if this error is path-related.
    pub fn is_path_error(&self) -> bool {
        matches!(self, Error::Path(_))
    }
}
