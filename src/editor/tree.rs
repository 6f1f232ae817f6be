//! Editor for an arbitrary-depth tree of records.
//!
//! Every operation targets one node's children, located by key. The tree is
//! held behind an [`Arc`] and edited copy-on-write: [`TreeEditor::snapshot`]
//! hands out an immutable view that stays consistent while the editor keeps
//! mutating, which is what deferred validation reads from.
//!
//! The root node wraps the caller's value. It is never removed and its value
//! is not editable through [`TreeEditor::update_node`].
//!
//! # Example
//!
//! ```
//! use treequill::editor::tree::TreeEditor;
//! use treequill::editor::host::RecordingHost;
//! use treequill::editor::EditorOptions;
//! use treequill::document::record::record_from_pairs;
//! use serde_json::json;
//!
//! let mut editor = TreeEditor::open(None, EditorOptions::default());
//! let root = editor.root_key();
//! let first = editor.add_child(root, record_from_pairs([("v", json!(1))])).unwrap();
//! editor.add_child(root, record_from_pairs([("v", json!(2))])).unwrap();
//! assert!(editor.remove_child(first, root));
//!
//! let mut host = RecordingHost::default();
//! let saved = editor.save(&mut host).unwrap();
//! assert_eq!(saved.children.len(), 1);
//! assert_eq!(saved.children[0].value["v"], json!(2));
//! ```

use super::host::CollectionHost;
use super::validation::{ValidationMap, ValidationTicket};
use super::EditorOptions;
use crate::document::node::{NodeKey, TreeItem, TreeNode};
use crate::document::ordering::{
    display_position_to_index, move_to, position_to_rank, renumber, renumber_in_place,
};
use crate::document::record::{FieldValue, Record};
use crate::document::tree::CollectionTree;
use crate::error::EditorError;
use crate::fields::{validate_record, FieldSet, FieldValidator, RecordPosition, RecordValidation};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tree collection editor.
#[derive(Debug, Clone)]
pub struct TreeEditor<V> {
    tree: Arc<CollectionTree<V>>,
    validation: ValidationMap<NodeKey>,
    options: EditorOptions,
}

impl<V: Clone> TreeEditor<V> {
    /// Opens a session, re-keying the whole input. `None` opens an empty root.
    pub fn open(initial: Option<TreeItem<V>>, options: EditorOptions) -> Self {
        let tree = match initial {
            Some(item) => CollectionTree::materialize(item),
            None => CollectionTree::empty(),
        };
        debug!(nodes = tree.len(), "opened tree collection");
        Self {
            tree: Arc::new(tree),
            validation: ValidationMap::new(),
            options,
        }
    }

    pub fn tree(&self) -> &CollectionTree<V> {
        &self.tree
    }

    /// Immutable view of the current tree, unaffected by later edits.
    pub fn snapshot(&self) -> Arc<CollectionTree<V>> {
        Arc::clone(&self.tree)
    }

    pub fn root_key(&self) -> NodeKey {
        self.tree.root().key()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn find(&self, key: NodeKey) -> Option<&TreeNode<V>> {
        self.tree.find_by_key(key)
    }

    /// Appends a child under `parent_key` and returns its key.
    ///
    /// Returns `None` without changing anything when the parent is unknown or
    /// item creation is disabled.
    pub fn add_child(&mut self, parent_key: NodeKey, value: Record<V>) -> Option<NodeKey> {
        if self.options.disable_item_creation {
            debug!("add ignored: item creation disabled");
            return None;
        }
        if self.tree.find_by_key(parent_key).is_none() {
            debug!(%parent_key, "add ignored: unknown parent");
            return None;
        }

        let parent = Arc::make_mut(&mut self.tree).find_by_key_mut(parent_key)?;
        let child = TreeNode::new(
            value,
            Some(parent_key),
            parent.level() + 1,
            position_to_rank(parent.children.len()),
        );
        let key = child.key();
        parent.children.push(child);
        debug!(%parent_key, %key, "added child");
        Some(key)
    }

    /// Removes `key` from the children of `parent_key`.
    ///
    /// Validity entries for the removed node and all of its descendants are
    /// dropped, and the remaining siblings are renumbered. Returns whether a
    /// node was removed.
    pub fn remove_child(&mut self, key: NodeKey, parent_key: NodeKey) -> bool {
        if self.options.disable_item_deletion {
            debug!("remove ignored: item deletion disabled");
            return false;
        }
        let present = self
            .tree
            .find_by_key(parent_key)
            .is_some_and(|p| p.children().iter().any(|c| c.key() == key));
        if !present {
            debug!(%key, %parent_key, "remove ignored: no such child");
            return false;
        }

        let Some(parent) = Arc::make_mut(&mut self.tree).find_by_key_mut(parent_key) else {
            return false;
        };
        let Some(pos) = parent.children.iter().position(|c| c.key() == key) else {
            return false;
        };
        let removed = parent.children.remove(pos);
        renumber_in_place(&mut parent.children);

        for stale in removed.subtree_keys() {
            self.validation.clear_valid(stale);
        }
        debug!(%key, %parent_key, "removed child");
        true
    }

    /// Replaces the value of `key`. The root and unknown keys are ignored.
    pub fn update_node(&mut self, key: NodeKey, value: Record<V>) -> bool {
        if key == self.root_key() {
            debug!("update ignored: root is not editable");
            return false;
        }
        if self.tree.find_by_key(key).is_none() {
            debug!(%key, "update ignored: unknown node");
            return false;
        }
        match Arc::make_mut(&mut self.tree).find_by_key_mut(key) {
            Some(node) => {
                node.set_value(value);
                debug!(%key, "updated node");
                true
            }
            None => false,
        }
    }

    /// Moves a child of `parent_key` from `old_index` to the 1-based
    /// `display_position`, then renumbers the siblings.
    pub fn reorder_children(
        &mut self,
        parent_key: NodeKey,
        old_index: usize,
        display_position: usize,
    ) -> bool {
        if !self.options.enable_sorting {
            debug!("reorder ignored: sorting disabled");
            return false;
        }
        let Some(target) = display_position_to_index(display_position) else {
            return false;
        };
        let in_range = self
            .tree
            .find_by_key(parent_key)
            .is_some_and(|p| old_index < p.children().len() && target < p.children().len());
        if !in_range {
            debug!(%parent_key, old_index, target, "reorder ignored: out of range");
            return false;
        }

        let Some(parent) = Arc::make_mut(&mut self.tree).find_by_key_mut(parent_key) else {
            return false;
        };
        let children = std::mem::take(&mut parent.children);
        parent.children = renumber(move_to(children, old_index, target));
        debug!(%parent_key, old_index, target, "reordered children");
        old_index != target
    }

    /// Records the validity of node `key`. Unknown keys are ignored.
    pub fn set_valid(&mut self, key: NodeKey, is_valid: bool) -> bool {
        if self.tree.find_by_key(key).is_none() {
            return false;
        }
        self.validation.set_valid(key, is_valid);
        true
    }

    /// Starts an asynchronous validation of node `key`.
    pub fn begin_validation(&mut self, key: NodeKey) -> Option<ValidationTicket<NodeKey>> {
        self.tree.find_by_key(key)?;
        Some(self.validation.begin(key))
    }

    /// Applies an asynchronous result; stale or orphaned tickets are ignored.
    pub fn complete_validation(&mut self, ticket: ValidationTicket<NodeKey>, is_valid: bool) -> bool {
        self.validation.complete(ticket, is_valid)
    }

    pub fn is_valid(&self, key: NodeKey) -> Option<bool> {
        self.validation.get(key)
    }

    pub fn all_valid(&self) -> bool {
        self.validation.all_valid()
    }

    /// Emits the cleaned tree: values and child order only.
    pub fn save<H>(&mut self, host: &mut H) -> Result<TreeItem<V>, EditorError>
    where
        H: CollectionHost<TreeItem<V>> + ?Sized,
    {
        if !self.validation.all_valid() {
            let invalid = self.validation.invalid_count();
            warn!(invalid, "save blocked by invalid nodes");
            return Err(EditorError::SaveBlocked { invalid });
        }
        let output = self.tree.to_item();
        debug!(nodes = self.tree.len(), "saving tree collection");
        host.on_save(output.clone());
        Ok(output)
    }

    /// Ends the session without emitting anything.
    pub fn cancel<H>(self, host: &mut H)
    where
        H: CollectionHost<TreeItem<V>> + ?Sized,
    {
        debug!("tree editor cancelled");
        host.on_close();
    }
}

impl<V: Clone + FieldValue> TreeEditor<V> {
    /// Validates node `key` against `fields` and records the result.
    pub fn validate_with<F>(
        &mut self,
        key: NodeKey,
        fields: &FieldSet<V>,
        validator: &F,
    ) -> Option<RecordValidation>
    where
        F: FieldValidator<V> + ?Sized,
    {
        let node = self.tree.find_by_key(key)?;
        let result = validate_record(fields, node.value(), RecordPosition::Key(key), validator);
        self.validation.set_valid(key, result.is_valid());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::record::record_from_pairs;
    use crate::editor::host::RecordingHost;
    use serde_json::{json, Value};

    fn rec(v: i64) -> Record<Value> {
        record_from_pairs([("v", json!(v))])
    }

    fn values(editor: &TreeEditor<Value>, parent: NodeKey) -> Vec<i64> {
        editor
            .find(parent)
            .map(|p| {
                p.children()
                    .iter()
                    .map(|c| c.value()["v"].as_i64().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn ranks(editor: &TreeEditor<Value>, parent: NodeKey) -> Vec<u32> {
        editor
            .find(parent)
            .map(|p| p.children().iter().map(TreeNode::sort_idx).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_add_child_sets_bookkeeping() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();
        let b = editor.add_child(a, rec(2)).unwrap();

        let node_b = editor.find(b).unwrap();
        assert_eq!(node_b.level(), 2);
        assert_eq!(node_b.parent_key(), Some(a));
        assert_eq!(node_b.sort_idx(), 1);
        assert_eq!(ranks(&editor, root), vec![1]);
    }

    #[test]
    fn test_add_child_unknown_parent_is_noop() {
        let mut editor: TreeEditor<Value> = TreeEditor::open(None, EditorOptions::default());
        assert!(editor.add_child(NodeKey::generate(), rec(1)).is_none());
        assert_eq!(editor.tree().len(), 1);
    }

    #[test]
    fn test_remove_child_renumbers_siblings() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let keys: Vec<_> = (1..=3).map(|v| editor.add_child(root, rec(v)).unwrap()).collect();

        assert!(editor.remove_child(keys[0], root));
        assert_eq!(values(&editor, root), vec![2, 3]);
        assert_eq!(ranks(&editor, root), vec![1, 2]);
    }

    #[test]
    fn test_remove_child_clears_subtree_validation() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();
        let b = editor.add_child(a, rec(2)).unwrap();
        editor.set_valid(b, false);
        assert!(!editor.all_valid());

        assert!(editor.remove_child(a, root));
        assert!(editor.all_valid());
        assert!(editor.find(b).is_none());
    }

    #[test]
    fn test_remove_child_with_wrong_parent_is_noop() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();
        let b = editor.add_child(root, rec(2)).unwrap();
        assert!(!editor.remove_child(b, a));
        assert!(!editor.remove_child(root, root));
        assert_eq!(values(&editor, root), vec![1, 2]);
    }

    #[test]
    fn test_update_node_and_root_protection() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();

        assert!(editor.update_node(a, rec(10)));
        assert_eq!(values(&editor, root), vec![10]);
        assert!(!editor.update_node(root, rec(99)));
        assert!(editor.tree().root().value().is_empty());
        assert!(!editor.update_node(NodeKey::generate(), rec(5)));
    }

    #[test]
    fn test_reorder_children() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        for v in 1..=3 {
            editor.add_child(root, rec(v));
        }
        assert!(editor.reorder_children(root, 2, 1));
        assert_eq!(values(&editor, root), vec![3, 1, 2]);
        assert_eq!(ranks(&editor, root), vec![1, 2, 3]);

        assert!(!editor.reorder_children(root, 0, 4));
        assert!(!editor.reorder_children(root, 0, 0));
        assert_eq!(values(&editor, root), vec![3, 1, 2]);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();

        let snapshot = editor.snapshot();
        editor.update_node(a, rec(2));
        editor.add_child(root, rec(3));

        assert_eq!(snapshot.find_by_key(a).unwrap().value()["v"], json!(1));
        assert_eq!(snapshot.root().children().len(), 1);
        assert_eq!(values(&editor, root), vec![2, 3]);
    }

    #[test]
    fn test_disabled_operations() {
        let options = EditorOptions {
            enable_sorting: false,
            disable_item_deletion: true,
            disable_item_creation: false,
        };
        let mut editor = TreeEditor::open(None, options);
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();
        editor.add_child(root, rec(2));
        assert!(!editor.remove_child(a, root));
        assert!(!editor.reorder_children(root, 0, 2));

        let mut creation_off = TreeEditor::open(
            None,
            EditorOptions {
                disable_item_creation: true,
                ..EditorOptions::default()
            },
        );
        let root = creation_off.root_key();
        assert!(creation_off.add_child(root, rec(1)).is_none());
    }

    #[test]
    fn test_save_strips_bookkeeping_and_is_gated() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();
        editor.set_valid(a, false);

        let mut host = RecordingHost::default();
        assert!(editor.save(&mut host).is_err());
        editor.set_valid(a, true);
        let saved = editor.save(&mut host).unwrap();

        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json, json!({"value": {}, "children": [{"value": {"v": 1}, "children": []}]}));
        assert_eq!(host.saved().len(), 1);
    }

    #[test]
    fn test_stale_ticket_after_removal_is_ignored() {
        let mut editor = TreeEditor::open(None, EditorOptions::default());
        let root = editor.root_key();
        let a = editor.add_child(root, rec(1)).unwrap();
        let ticket = editor.begin_validation(a).unwrap();
        editor.remove_child(a, root);
        assert!(!editor.complete_validation(ticket, false));
        assert!(editor.all_valid());
    }
}
