//! Integration tests for the flat collection editor.

use serde_json::{json, Value};
use treequill::document::node::FlatItem;
use treequill::document::record::{record_from_pairs, Record};
use treequill::editor::flat::FlatEditor;
use treequill::editor::host::RecordingHost;
use treequill::editor::EditorOptions;
use treequill::error::{EditorError, Operation};

fn named(name: &str) -> Record<Value> {
    record_from_pairs([("name", json!(name))])
}

fn item(name: &str) -> FlatItem<Value> {
    FlatItem::new(named(name))
}

fn names(items: &[FlatItem<Value>]) -> Vec<&str> {
    items
        .iter()
        .map(|i| i.record["name"].as_str().unwrap_or_default())
        .collect()
}

#[test]
fn test_add_reorder_save() {
    let mut editor = FlatEditor::open(Vec::new(), EditorOptions::default());
    let mut host = RecordingHost::default();

    editor.add(named("a")).unwrap();
    editor.add(named("b")).unwrap();
    assert!(editor.reorder(0, 2));
    let saved = editor.save(&mut host).unwrap();

    assert_eq!(names(&saved), vec!["b", "a"]);
    assert_eq!(saved[0].sort_idx, Some(1));
    assert_eq!(saved[1].sort_idx, Some(2));
    assert_eq!(host.last_saved(), Some(&saved));
}

#[test]
fn test_saved_json_shape() {
    let mut editor = FlatEditor::open(vec![item("a")], EditorOptions::default());
    let mut host = RecordingHost::default();
    let saved = editor.save(&mut host).unwrap();

    let value = serde_json::to_value(&saved).unwrap();
    assert_eq!(value, json!([{"sortIdx": 1, "name": "a"}]));
}

#[test]
fn test_stage_then_save_and_add() {
    let mut editor = FlatEditor::open(vec![item("a")], EditorOptions::default());
    let mut host = RecordingHost::default();

    editor
        .stage_for_creation(record_from_pairs([("x", json!(1))]), true)
        .unwrap();
    let saved = editor.save_and_add_staged(&mut host).unwrap();

    assert_eq!(saved.len(), 2);
    assert_eq!(saved[1].record["x"], json!(1));
    assert_eq!(saved[1].sort_idx, Some(2));
    assert!(editor.staged().is_none());
}

#[test]
fn test_invalid_staged_record_is_not_committed() {
    let mut editor = FlatEditor::open(vec![item("a")], EditorOptions::default());
    let mut host = RecordingHost::default();

    editor
        .stage_for_creation(record_from_pairs([("x", json!(1))]), false)
        .unwrap();
    let saved = editor.save_and_add_staged(&mut host).unwrap();

    assert_eq!(saved.len(), 1);
    assert!(editor.staged().is_some());
}

#[test]
fn test_update_out_of_range_leaves_state_intact() {
    let mut editor = FlatEditor::open(
        vec![item("a"), item("b"), item("c")],
        EditorOptions::default(),
    );

    let err = editor.update(5, named("z")).unwrap_err();
    assert_eq!(err, EditorError::IndexOutOfRange { index: 5, len: 3 });

    // later valid operations still see the original data
    editor.update(1, named("B")).unwrap();
    let mut host = RecordingHost::default();
    let saved = editor.save(&mut host).unwrap();
    assert_eq!(names(&saved), vec!["a", "B", "c"]);
    assert_eq!(
        saved.iter().map(|i| i.sort_idx).collect::<Vec<_>>(),
        vec![Some(1), Some(2), Some(3)]
    );
}

#[test]
fn test_delete_renumbers_and_drops_validity() {
    let mut editor = FlatEditor::open(
        vec![item("a"), item("b"), item("c")],
        EditorOptions::default(),
    );
    editor.set_valid(1, false).unwrap();
    assert!(!editor.all_valid());

    editor.delete(1).unwrap();

    assert!(editor.all_valid());
    assert_eq!(editor.len(), 2);
    assert_eq!(
        editor.items().iter().map(|n| n.sort_idx()).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[test]
fn test_validity_follows_record_across_reorder() {
    let mut editor = FlatEditor::open(
        vec![item("a"), item("b"), item("c")],
        EditorOptions::default(),
    );
    editor.set_valid(0, false).unwrap();
    editor.reorder(0, 3);

    assert_eq!(editor.is_valid_at(2), Some(false));
    assert_eq!(editor.is_valid_at(0), None);
}

#[test]
fn test_invalid_record_blocks_save() {
    let mut editor = FlatEditor::open(vec![item("a")], EditorOptions::default());
    let mut host = RecordingHost::default();
    editor.set_valid(0, false).unwrap();

    let err = editor.save(&mut host).unwrap_err();
    assert_eq!(err, EditorError::SaveBlocked { invalid: 1 });
    assert!(host.saved().is_empty());

    editor.set_valid(0, true).unwrap();
    assert!(editor.save(&mut host).is_ok());
}

#[test]
fn test_stale_validation_result_is_ignored() {
    let mut editor = FlatEditor::open(vec![item("a")], EditorOptions::default());

    let first = editor.begin_validation(0).unwrap();
    let second = editor.begin_validation(0).unwrap();

    assert!(editor.complete_validation(second, true));
    assert!(!editor.complete_validation(first, false));
    assert_eq!(editor.is_valid_at(0), Some(true));
}

#[test]
fn test_open_ranks_missing_sort_idx_by_position() {
    let items = vec![
        FlatItem {
            sort_idx: Some(3),
            record: named("late"),
        },
        item("second"),
        FlatItem {
            sort_idx: Some(1),
            record: named("first"),
        },
    ];
    let editor = FlatEditor::open(items, EditorOptions::default());
    let saved = editor.to_items();

    assert_eq!(names(&saved), vec!["first", "second", "late"]);
}

#[test]
fn test_disabled_operations() {
    let options = EditorOptions {
        enable_sorting: false,
        disable_item_deletion: true,
        disable_item_creation: true,
    };
    let mut editor = FlatEditor::open(vec![item("a"), item("b")], options);

    assert_eq!(
        editor.add(named("c")),
        Err(EditorError::OperationDisabled(Operation::Creation))
    );
    assert_eq!(
        editor.delete(0),
        Err(EditorError::OperationDisabled(Operation::Deletion))
    );
    assert!(!editor.reorder(0, 2));
    assert_eq!(names(&editor.to_items()), vec!["a", "b"]);
}

#[test]
fn test_cancel_emits_nothing() {
    let mut editor = FlatEditor::open(vec![item("a")], EditorOptions::default());
    let mut host = RecordingHost::default();
    editor.add(named("b")).unwrap();

    editor.cancel(&mut host);

    assert!(host.saved().is_empty());
    assert_eq!(host.close_count(), 1);
}

#[test]
fn test_record_rank_field_never_overrides_position() {
    let mut editor = FlatEditor::open(Vec::new(), EditorOptions::default());
    let mut host = RecordingHost::default();

    editor
        .add(record_from_pairs([("name", json!("a")), ("sortIdx", json!(9))]))
        .unwrap();
    editor.add(named("b")).unwrap();
    editor
        .update(1, record_from_pairs([("sortIdx", json!(0)), ("name", json!("B"))]))
        .unwrap();
    let staged = record_from_pairs([("name", json!("c")), ("sortIdx", json!(1))]);
    editor.stage_for_creation(staged, true).unwrap();
    let saved = editor.save_and_add_staged(&mut host).unwrap();

    let value = serde_json::to_value(&saved).unwrap();
    assert_eq!(
        value,
        json!([
            {"sortIdx": 1, "name": "a"},
            {"sortIdx": 2, "name": "B"},
            {"sortIdx": 3, "name": "c"}
        ])
    );
    let text = serde_json::to_string(&saved).unwrap();
    assert_eq!(text.matches("sortIdx").count(), 3);
}
