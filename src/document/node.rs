//! Node types for flat and tree collections.
//!
//! Internal nodes (`FlatNode`, `TreeNode`) carry editor bookkeeping: a
//! generated key, a 1-based rank and, for trees, the parent key and depth.
//! The external shapes (`FlatItem`, `TreeItem`) are what callers hand in and
//! receive back on save; the tree shape never carries bookkeeping fields.

use super::record::Record;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of the rank field in the external flat shape.
pub const SORT_IDX_FIELD: &str = "sortIdx";

/// Opaque identity of a node within one editing session.
///
/// Keys are generated when a node is materialized and are never derived from
/// the record's content.
///
/// # Example
///
/// ```
/// use treequill::document::node::NodeKey;
///
/// let a = NodeKey::generate();
/// let b = NodeKey::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(Uuid);

impl NodeKey {
    /// Generates a fresh key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// One element of a flat collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode<V> {
    key: NodeKey,
    pub(crate) sort_idx: u32,
    record: Record<V>,
}

impl<V> FlatNode<V> {
    /// Creates a node with a fresh key.
    ///
    /// The rank belongs to the node, so a `sortIdx` entry in `record` is
    /// dropped.
    pub fn new(mut record: Record<V>, sort_idx: u32) -> Self {
        record.shift_remove(SORT_IDX_FIELD);
        Self {
            key: NodeKey::generate(),
            sort_idx,
            record,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn sort_idx(&self) -> u32 {
        self.sort_idx
    }

    pub fn record(&self) -> &Record<V> {
        &self.record
    }

    pub(crate) fn set_record(&mut self, mut record: Record<V>) {
        record.shift_remove(SORT_IDX_FIELD);
        self.record = record;
    }
}

impl<V: Clone> FlatNode<V> {
    /// Converts to the external shape, carrying the current rank.
    pub fn to_item(&self) -> FlatItem<V> {
        FlatItem {
            sort_idx: Some(self.sort_idx),
            record: self.record.clone(),
        }
    }
}

/// External shape of a flat collection element: the record's fields plus
/// an optional `sortIdx` field.
///
/// # Example
///
/// ```
/// use treequill::document::node::FlatItem;
/// use serde_json::json;
///
/// let item: FlatItem<serde_json::Value> =
///     serde_json::from_value(json!({"name": "a", "sortIdx": 2})).unwrap();
/// assert_eq!(item.sort_idx, Some(2));
/// assert_eq!(item.record["name"], json!("a"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatItem<V> {
    /// Ranks that are not whole non-negative numbers read as `None`.
    #[serde(
        rename = "sortIdx",
        default,
        deserialize_with = "lenient_rank",
        skip_serializing_if = "Option::is_none"
    )]
    pub sort_idx: Option<u32>,
    #[serde(flatten)]
    pub record: Record<V>,
}

impl<V> FlatItem<V> {
    /// Wraps a record that has no rank yet.
    pub fn new(record: Record<V>) -> Self {
        Self {
            sort_idx: None,
            record,
        }
    }
}

fn lenient_rank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(rank_from_value))
}

fn rank_from_value(value: &serde_json::Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let n = value.as_f64()?;
    if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) {
        Some(n as u32)
    } else {
        None
    }
}

/// External shape of a tree node: a value and its ordered children.
///
/// Unknown fields (such as stale `key` or `level` values) are ignored when
/// deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeItem<V> {
    #[serde(default)]
    pub value: Record<V>,
    #[serde(default)]
    pub children: Vec<TreeItem<V>>,
}

impl<V> TreeItem<V> {
    pub fn new(value: Record<V>) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }

    /// Builder-style helper that appends a child.
    pub fn with_child(mut self, child: TreeItem<V>) -> Self {
        self.children.push(child);
        self
    }
}

/// One node of a materialized tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<V> {
    key: NodeKey,
    parent_key: Option<NodeKey>,
    level: u32,
    pub(crate) sort_idx: u32,
    value: Record<V>,
    pub(crate) children: Vec<TreeNode<V>>,
}

impl<V> TreeNode<V> {
    /// Creates a childless node with a fresh key.
    pub(crate) fn new(
        value: Record<V>,
        parent_key: Option<NodeKey>,
        level: u32,
        sort_idx: u32,
    ) -> Self {
        Self {
            key: NodeKey::generate(),
            parent_key,
            level,
            sort_idx,
            value,
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent_key(&self) -> Option<NodeKey> {
        self.parent_key
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sort_idx(&self) -> u32 {
        self.sort_idx
    }

    pub fn value(&self) -> &Record<V> {
        &self.value
    }

    pub fn children(&self) -> &[TreeNode<V>] {
        &self.children
    }

    pub(crate) fn set_value(&mut self, value: Record<V>) {
        self.value = value;
    }

    /// Collects the keys of this node and all of its descendants.
    pub fn subtree_keys(&self) -> Vec<NodeKey> {
        let mut keys = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            keys.push(node.key);
            stack.extend(node.children.iter());
        }
        keys
    }
}

impl<V: Clone> TreeNode<V> {
    /// Strips bookkeeping recursively, keeping only values and child order.
    pub fn to_item(&self) -> TreeItem<V> {
        TreeItem {
            value: self.value.clone(),
            children: self.children.iter().map(TreeNode::to_item).collect(),
        }
    }
}
