//! Error types for controller operations.

use thiserror::Error;

/// Structured errors from the form-controller contract.
///
/// These cover misuse of the contract itself. Validation failures are never
/// errors here; they are data in the controller's error tree.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A structural write targeted an array path that was never registered.
    #[error("Array path '{path}' is not registered with the controller")]
    ArrayNotRegistered { path: String },
}

impl ControllerError {
    /// Check if this error indicates a missing registration.
    pub fn is_not_registered(&self) -> bool {
        matches!(self, ControllerError::ArrayNotRegistered { .. })
    }
}

impl From<ControllerError> for crate::Error {
    fn from(err: ControllerError) -> Self {
        crate::Error::Controller(err)
    }
}
