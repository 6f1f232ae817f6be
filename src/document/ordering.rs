//! Sort-order bookkeeping for ordered sibling sequences.
//!
//! Sibling order is always the authoritative order. A node's `sort_idx` is a
//! cached 1-based rank that must be recomputed with [`renumber`] after every
//! structural change.
//!
//! # Example
//!
//! ```
//! use treequill::document::node::FlatNode;
//! use treequill::document::ordering::{move_to, renumber, Ranked};
//! use treequill::document::record::Record;
//!
//! let nodes: Vec<FlatNode<i32>> = (0..3).map(|_| FlatNode::new(Record::new(), 0)).collect();
//! let first = nodes[0].key();
//!
//! let nodes = renumber(move_to(nodes, 0, 2));
//! assert_eq!(nodes[2].key(), first);
//! assert_eq!(nodes.iter().map(|n| n.rank()).collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```

use super::node::{FlatNode, TreeNode};

/// Anything that carries a cached 1-based rank.
pub trait Ranked {
    fn rank(&self) -> u32;
    fn set_rank(&mut self, rank: u32);
}

impl<V> Ranked for FlatNode<V> {
    fn rank(&self) -> u32 {
        self.sort_idx
    }

    fn set_rank(&mut self, rank: u32) {
        self.sort_idx = rank;
    }
}

impl<V> Ranked for TreeNode<V> {
    fn rank(&self) -> u32 {
        self.sort_idx
    }

    fn set_rank(&mut self, rank: u32) {
        self.sort_idx = rank;
    }
}

/// Reassigns every element's rank to its 1-based position.
pub fn renumber<T: Ranked>(mut sequence: Vec<T>) -> Vec<T> {
    renumber_in_place(&mut sequence);
    sequence
}

/// In-place form of [`renumber`].
pub fn renumber_in_place<T: Ranked>(sequence: &mut [T]) {
    for (idx, item) in sequence.iter_mut().enumerate() {
        item.set_rank(position_to_rank(idx));
    }
}

/// Removes the element at `from` and reinserts it at `to`.
///
/// Returns the input unchanged when either index is outside `[0, len)`.
/// Ranks are not touched; call [`renumber`] afterwards.
pub fn move_to<T>(mut sequence: Vec<T>, from: usize, to: usize) -> Vec<T> {
    let len = sequence.len();
    if from >= len || to >= len {
        return sequence;
    }
    let element = sequence.remove(from);
    sequence.insert(to, element);
    sequence
}

/// Stable sort by cached rank.
pub fn sort_by_rank<T: Ranked>(sequence: &mut [T]) {
    sequence.sort_by_key(Ranked::rank);
}

/// Converts a 1-based display position into a 0-based index.
///
/// Position `0` has no index and yields `None`.
pub fn display_position_to_index(position: usize) -> Option<usize> {
    position.checked_sub(1)
}

/// Converts a 0-based index into a 1-based rank, saturating at `u32::MAX`.
pub(crate) fn position_to_rank(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}
