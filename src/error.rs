//! Error types for editor operations.
//!
//! Structural no-ops (an unknown key, a move target outside the sequence)
//! are not errors: the operation is ignored and reports `false` or `None`.
//! `EditorError` covers deterministic rejections that callers must handle.

use thiserror::Error;

/// An editor operation that can be turned off through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Creation,
    Deletion,
    Sorting,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Creation => "item creation",
            Operation::Deletion => "item deletion",
            Operation::Sorting => "sorting",
        };
        f.write_str(name)
    }
}

/// Errors returned by editor operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// An index addressed an element past the end of the collection.
    #[error("index {index} is out of range for a collection of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// Save was requested while at least one entry is invalid.
    #[error("cannot save: {invalid} item(s) failed validation")]
    SaveBlocked { invalid: usize },

    /// The operation is disabled by the editor options.
    #[error("{0} is disabled")]
    OperationDisabled(Operation),
}
