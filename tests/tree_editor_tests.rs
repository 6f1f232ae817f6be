//! Integration tests for the tree collection editor.

use serde_json::{json, Value};
use treequill::document::node::TreeItem;
use treequill::document::record::{record_from_pairs, Record};
use treequill::editor::host::RecordingHost;
use treequill::editor::tree::TreeEditor;
use treequill::editor::EditorOptions;
use treequill::error::EditorError;

fn rec(v: i64) -> Record<Value> {
    record_from_pairs([("v", json!(v))])
}

fn leaf(v: i64) -> TreeItem<Value> {
    TreeItem::new(rec(v))
}

fn sample() -> TreeItem<Value> {
    TreeItem::new(Record::new())
        .with_child(leaf(1).with_child(leaf(11)).with_child(leaf(12)))
        .with_child(leaf(2))
}

#[test]
fn test_add_add_remove_save() {
    let mut editor = TreeEditor::open(None, EditorOptions::default());
    let mut host = RecordingHost::default();
    let root = editor.root_key();

    let first = editor.add_child(root, rec(1)).unwrap();
    editor.add_child(root, rec(2)).unwrap();
    assert!(editor.remove_child(first, root));
    let saved = editor.save(&mut host).unwrap();

    assert_eq!(saved.children.len(), 1);
    assert_eq!(saved.children[0].value, rec(2));
    assert_eq!(editor.find(root).unwrap().children()[0].sort_idx(), 1);
}

#[test]
fn test_saved_tree_has_no_bookkeeping() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let mut host = RecordingHost::default();
    let saved = editor.save(&mut host).unwrap();

    let text = serde_json::to_string(&saved).unwrap();
    for field in ["key", "level", "sortIdx", "parentKey"] {
        assert!(!text.contains(field), "saved tree leaked {}: {}", field, text);
    }
    assert_eq!(saved, sample());
}

#[test]
fn test_supplied_keys_are_ignored() {
    let input: TreeItem<Value> = serde_json::from_value(json!({
        "key": "stale",
        "value": {},
        "children": [
            {"key": "dup", "level": 7, "value": {"v": 1}},
            {"key": "dup", "level": 7, "value": {"v": 2}}
        ]
    }))
    .unwrap();
    let editor = TreeEditor::open(Some(input), EditorOptions::default());
    let children = editor.tree().root().children();

    assert_ne!(children[0].key(), children[1].key());
    assert!(children.iter().all(|c| c.level() == 1));
}

#[test]
fn test_remove_subtree_clears_descendant_validity() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let root = editor.root_key();
    let first = editor.tree().key_at_path(&[0]).unwrap();
    let grandchild = editor.tree().key_at_path(&[0, 1]).unwrap();

    editor.set_valid(grandchild, false);
    assert!(!editor.all_valid());

    assert!(editor.remove_child(first, root));
    assert!(editor.all_valid());
    assert_eq!(editor.is_valid(grandchild), None);
}

#[test]
fn test_invalid_node_blocks_save() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let mut host = RecordingHost::default();
    let node = editor.tree().key_at_path(&[1]).unwrap();

    editor.set_valid(node, false);
    assert_eq!(
        editor.save(&mut host),
        Err(EditorError::SaveBlocked { invalid: 1 })
    );
    editor.set_valid(node, true);
    assert!(editor.save(&mut host).is_ok());
    assert_eq!(host.saved().len(), 1);
}

#[test]
fn test_unknown_keys_are_no_ops() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let other = TreeEditor::<Value>::open(None, EditorOptions::default()).root_key();
    let before = editor.tree().to_item();

    assert!(editor.add_child(other, rec(9)).is_none());
    assert!(!editor.update_node(other, rec(9)));
    assert!(!editor.remove_child(other, editor.root_key()));
    assert!(!editor.reorder_children(other, 0, 1));
    assert!(!editor.set_valid(other, false));

    assert_eq!(editor.tree().to_item(), before);
    assert!(editor.all_valid());
}

#[test]
fn test_root_is_not_editable() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let root = editor.root_key();

    assert!(!editor.update_node(root, rec(0)));
    assert!(editor.tree().root().value().is_empty());
}

#[test]
fn test_reorder_nested_children() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let parent = editor.tree().key_at_path(&[0]).unwrap();

    assert!(editor.reorder_children(parent, 1, 1));
    let children = editor.find(parent).unwrap().children();
    assert_eq!(children[0].value(), &rec(12));
    assert_eq!(children[0].sort_idx(), 1);
    assert_eq!(children[1].sort_idx(), 2);
}

#[test]
fn test_snapshot_is_isolated_from_edits() {
    let mut editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let snapshot = editor.snapshot();
    let root = editor.root_key();

    editor.add_child(root, rec(3)).unwrap();

    assert_eq!(snapshot.root().children().len(), 2);
    assert_eq!(editor.tree().root().children().len(), 3);
}

#[test]
fn test_cancel_emits_nothing() {
    let editor = TreeEditor::open(Some(sample()), EditorOptions::default());
    let mut host = RecordingHost::default();

    editor.cancel(&mut host);

    assert!(host.saved().is_empty());
    assert_eq!(host.close_count(), 1);
}
