//! Collection editors and their supporting state.
//!
//! # Modules
//!
//! - `flat`: editor for a flat ordered list of records
//! - `tree`: editor for an arbitrary-depth tree of records
//! - `validation`: per-node validity tracking gating save
//! - `debounce`: deferred, superseding request scheduling
//! - `host`: the caller-supplied save/close collaborator
//!
//! # Example
//!
//! ```
//! use treequill::editor::EditorOptions;
//!
//! let options = EditorOptions::default();
//! assert!(options.enable_sorting);
//! assert!(!options.disable_item_deletion);
//! ```

pub mod debounce;
pub mod flat;
pub mod host;
pub mod tree;
pub mod validation;

use crate::error::{EditorError, Operation};

/// Switches that turn individual editing operations on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    /// Allow reordering
    pub enable_sorting: bool,
    /// Forbid removing items
    pub disable_item_deletion: bool,
    /// Forbid adding or staging items
    pub disable_item_creation: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            enable_sorting: true,
            disable_item_deletion: false,
            disable_item_creation: false,
        }
    }
}

impl EditorOptions {
    /// Returns an error if `operation` is turned off.
    pub fn ensure_allowed(&self, operation: Operation) -> Result<(), EditorError> {
        let allowed = match operation {
            Operation::Creation => !self.disable_item_creation,
            Operation::Deletion => !self.disable_item_deletion,
            Operation::Sorting => self.enable_sorting,
        };
        if allowed {
            Ok(())
        } else {
            Err(EditorError::OperationDisabled(operation))
        }
    }
}
