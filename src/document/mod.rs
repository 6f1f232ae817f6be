//! Collection data model.
//!
//! # Modules
//!
//! - `record`: the generic field bag edited by users
//! - `node`: flat and tree nodes plus their external (serialized) shapes
//! - `ordering`: sort-order bookkeeping shared by both editors
//! - `tree`: the single-root tree with key lookup and cleaning

pub mod node;
pub mod ordering;
pub mod record;
pub mod tree;
