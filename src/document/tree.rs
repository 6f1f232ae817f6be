//! Single-root collection tree.
//!
//! `CollectionTree` wraps an externally supplied tree in internal
//! [`TreeNode`]s. Materialization is a full re-keying pass: every node gets a
//! fresh key, its depth from the root and its rank among its siblings.
//!
//! Nodes are addressed two ways:
//! - by [`NodeKey`], the stable identity used by the editor
//! - by a positional path of child indices from the root, mirroring how a
//!   rendered tree is walked top-down
//!
//! # Example
//!
//! ```
//! use treequill::document::node::TreeItem;
//! use treequill::document::record::record_from_pairs;
//! use treequill::document::tree::CollectionTree;
//! use serde_json::json;
//!
//! let item = TreeItem::new(record_from_pairs([("v", json!(0))]))
//!     .with_child(TreeItem::new(record_from_pairs([("v", json!(1))])));
//! let tree = CollectionTree::materialize(item);
//!
//! let child_key = tree.key_at_path(&[0]).unwrap();
//! let child = tree.find_by_key(child_key).unwrap();
//! assert_eq!(child.level(), 1);
//! assert_eq!(child.parent_key(), Some(tree.root().key()));
//! ```

use super::node::{NodeKey, TreeItem, TreeNode};
use super::ordering::position_to_rank;
use super::record::Record;

/// A materialized tree with exactly one root.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionTree<V> {
    root: TreeNode<V>,
}

impl<V> CollectionTree<V> {
    /// Creates a tree holding only an empty root.
    pub fn empty() -> Self {
        Self {
            root: TreeNode::new(Record::new(), None, 0, 1),
        }
    }

    /// Materializes an external tree, assigning fresh keys, levels and ranks.
    pub fn materialize(item: TreeItem<V>) -> Self {
        Self {
            root: materialize_node(item, None, 0, 1),
        }
    }

    pub fn root(&self) -> &TreeNode<V> {
        &self.root
    }

    /// Finds a node by key with a depth-first search.
    ///
    /// Returns `None` when the key is not in the tree.
    pub fn find_by_key(&self, key: NodeKey) -> Option<&TreeNode<V>> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.key() == key {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Mutable form of [`find_by_key`](Self::find_by_key).
    pub(crate) fn find_by_key_mut(&mut self, key: NodeKey) -> Option<&mut TreeNode<V>> {
        let mut stack = vec![&mut self.root];
        while let Some(node) = stack.pop() {
            if node.key() == key {
                return Some(node);
            }
            stack.extend(node.children.iter_mut().rev());
        }
        None
    }

    /// Resolves a positional path (child indices from the root) to a key.
    ///
    /// The empty path resolves to the root.
    pub fn key_at_path(&self, path: &[usize]) -> Option<NodeKey> {
        let mut current = &self.root;
        for &index in path {
            current = current.children.get(index)?;
        }
        Some(current.key())
    }

    /// Returns the positional path of a node, or `None` if it is absent.
    pub fn path_of(&self, key: NodeKey) -> Option<Vec<usize>> {
        let mut stack: Vec<(&TreeNode<V>, Vec<usize>)> = vec![(&self.root, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if node.key() == key {
                return Some(path);
            }
            for (idx, child) in node.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(idx);
                stack.push((child, child_path));
            }
        }
        None
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.root.subtree_keys().len()
    }

    /// A tree always holds its root, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<V: Clone> CollectionTree<V> {
    /// Strips all bookkeeping and returns the external shape.
    pub fn to_item(&self) -> TreeItem<V> {
        self.root.to_item()
    }
}

impl<V> Default for CollectionTree<V> {
    fn default() -> Self {
        Self::empty()
    }
}

fn materialize_node<V>(
    item: TreeItem<V>,
    parent_key: Option<NodeKey>,
    level: u32,
    sort_idx: u32,
) -> TreeNode<V> {
    let mut node = TreeNode::new(item.value, parent_key, level, sort_idx);
    let key = node.key();
    node.children = item
        .children
        .into_iter()
        .enumerate()
        .map(|(idx, child)| materialize_node(child, Some(key), level + 1, position_to_rank(idx)))
        .collect();
    node
}
