//! treequill - an ordered, hierarchical collection editing model.
//!
//! The crate provides two editors sharing one design:
//!
//! - [`editor::flat::FlatEditor`] edits a flat, ordered list of records.
//! - [`editor::tree::TreeEditor`] edits an arbitrary-depth tree of records.
//!
//! Both load an external value on open, expose add/update/delete/reorder
//! operations, track per-record validity, and emit a cleaned value on save.

pub mod command;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod fields;
pub mod file;
pub mod logging;
