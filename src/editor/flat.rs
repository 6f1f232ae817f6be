//! Editor for a flat, ordered list of records.
//!
//! The editor owns a deep copy of the caller's list for the length of one
//! session. Every structural change renumbers the list so each element's
//! `sortIdx` equals its 1-based position. One record may be staged for
//! creation at a time; it only joins the list when explicitly added.
//!
//! Validity is tracked per element through the element's generated key, so
//! deleting or reordering never reattaches a flag to the wrong record.
//!
//! # Example
//!
//! ```
//! use treequill::editor::flat::FlatEditor;
//! use treequill::editor::host::RecordingHost;
//! use treequill::editor::EditorOptions;
//! use treequill::document::record::record_from_pairs;
//! use serde_json::json;
//!
//! let mut editor = FlatEditor::open(Vec::new(), EditorOptions::default());
//! editor.add(record_from_pairs([("name", json!("a"))])).unwrap();
//! editor.add(record_from_pairs([("name", json!("b"))])).unwrap();
//! editor.reorder(0, 2);
//!
//! let mut host = RecordingHost::default();
//! let saved = editor.save(&mut host).unwrap();
//! assert_eq!(saved[0].record["name"], json!("b"));
//! assert_eq!(saved[0].sort_idx, Some(1));
//! assert_eq!(saved[1].sort_idx, Some(2));
//! ```

use super::host::CollectionHost;
use super::validation::{ValidationMap, ValidationTicket};
use super::EditorOptions;
use crate::document::node::{FlatItem, FlatNode, NodeKey, SORT_IDX_FIELD};
use crate::document::ordering::{
    display_position_to_index, move_to, position_to_rank, renumber, renumber_in_place,
    sort_by_rank,
};
use crate::document::record::{FieldValue, Record};
use crate::error::{EditorError, Operation};
use crate::fields::{validate_record, FieldSet, FieldValidator, RecordPosition, RecordValidation};
use tracing::{debug, warn};

/// A record being composed, not yet part of the list.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord<V> {
    pub record: Record<V>,
    pub is_valid: bool,
}

/// Flat collection editor.
#[derive(Debug, Clone)]
pub struct FlatEditor<V> {
    items: Vec<FlatNode<V>>,
    staged: Option<StagedRecord<V>>,
    validation: ValidationMap<NodeKey>,
    options: EditorOptions,
}

impl<V: Clone> FlatEditor<V> {
    /// Opens a session on `initial`.
    ///
    /// Elements without a `sortIdx` get their original position as rank; the
    /// list is then stably sorted by rank and renumbered, so partially ranked
    /// input is accepted.
    pub fn open(initial: Vec<FlatItem<V>>, options: EditorOptions) -> Self {
        let mut items: Vec<FlatNode<V>> = initial
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let rank = item.sort_idx.unwrap_or_else(|| position_to_rank(idx));
                FlatNode::new(item.record, rank)
            })
            .collect();
        sort_by_rank(&mut items);
        let items = renumber(items);
        debug!(count = items.len(), "opened flat collection");

        Self {
            items,
            staged: None,
            validation: ValidationMap::new(),
            options,
        }
    }

    pub fn items(&self) -> &[FlatNode<V>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FlatNode<V>> {
        self.items.get(index)
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn staged(&self) -> Option<&StagedRecord<V>> {
        self.staged.as_ref()
    }

    /// Appends a record and clears the staged slot.
    pub fn add(&mut self, record: Record<V>) -> Result<(), EditorError> {
        self.options.ensure_allowed(Operation::Creation)?;
        self.push(record);
        self.staged = None;
        Ok(())
    }

    /// Replaces the record at `index` in place.
    pub fn update(&mut self, index: usize, record: Record<V>) -> Result<(), EditorError> {
        let len = self.items.len();
        let node = self
            .items
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;
        node.set_record(record);
        debug!(index, "updated record");
        Ok(())
    }

    /// Removes the record at `index` and forgets its validity.
    pub fn delete(&mut self, index: usize) -> Result<(), EditorError> {
        self.options.ensure_allowed(Operation::Deletion)?;
        let len = self.items.len();
        if index >= len {
            return Err(EditorError::IndexOutOfRange { index, len });
        }
        let removed = self.items.remove(index);
        self.validation.clear_valid(removed.key());
        renumber_in_place(&mut self.items);
        sort_by_rank(&mut self.items);
        debug!(index, remaining = self.items.len(), "deleted record");
        Ok(())
    }

    /// Moves the record at `old_index` to the 1-based `display_position`.
    ///
    /// Returns whether the list changed. Out-of-range indices and disabled
    /// sorting leave the list untouched.
    pub fn reorder(&mut self, old_index: usize, display_position: usize) -> bool {
        if !self.options.enable_sorting {
            debug!("reorder ignored: sorting disabled");
            return false;
        }
        let Some(target) = display_position_to_index(display_position) else {
            debug!(display_position, "reorder ignored: no such position");
            return false;
        };
        let len = self.items.len();
        if old_index >= len || target >= len {
            debug!(old_index, target, len, "reorder ignored: out of range");
            return false;
        }

        let items = std::mem::take(&mut self.items);
        let mut items = renumber(move_to(items, old_index, target));
        sort_by_rank(&mut items);
        self.items = items;
        debug!(old_index, target, "reordered record");
        old_index != target
    }

    /// Replaces the staged record and its validity.
    pub fn stage_for_creation(
        &mut self,
        mut record: Record<V>,
        is_valid: bool,
    ) -> Result<(), EditorError> {
        self.options.ensure_allowed(Operation::Creation)?;
        record.shift_remove(SORT_IDX_FIELD);
        self.staged = Some(StagedRecord { record, is_valid });
        Ok(())
    }

    /// Drops the staged record, if any.
    pub fn discard_staged(&mut self) -> Option<StagedRecord<V>> {
        self.staged.take()
    }

    /// Records the validity of the record at `index`.
    pub fn set_valid(&mut self, index: usize, is_valid: bool) -> Result<(), EditorError> {
        let key = self.key_at(index)?;
        self.validation.set_valid(key, is_valid);
        Ok(())
    }

    /// Starts an asynchronous validation of the record at `index`.
    pub fn begin_validation(&mut self, index: usize) -> Result<ValidationTicket<NodeKey>, EditorError> {
        let key = self.key_at(index)?;
        Ok(self.validation.begin(key))
    }

    /// Applies an asynchronous validation result. Stale tickets are ignored.
    pub fn complete_validation(&mut self, ticket: ValidationTicket<NodeKey>, is_valid: bool) -> bool {
        self.validation.complete(ticket, is_valid)
    }

    pub fn is_valid_at(&self, index: usize) -> Option<bool> {
        self.items
            .get(index)
            .and_then(|node| self.validation.get(node.key()))
    }

    /// True when no recorded entry is invalid.
    pub fn all_valid(&self) -> bool {
        self.validation.all_valid()
    }

    /// Emits the current list. The staged record is not included.
    pub fn save<H>(&mut self, host: &mut H) -> Result<Vec<FlatItem<V>>, EditorError>
    where
        H: CollectionHost<Vec<FlatItem<V>>> + ?Sized,
    {
        self.ensure_saveable()?;
        let output = self.to_items();
        debug!(count = output.len(), "saving flat collection");
        host.on_save(output.clone());
        Ok(output)
    }

    /// Commits a valid staged record, then emits the list.
    ///
    /// Without a staged record, or with an invalid one, this is a plain
    /// [`save`](Self::save) and the staged record stays where it is.
    pub fn save_and_add_staged<H>(&mut self, host: &mut H) -> Result<Vec<FlatItem<V>>, EditorError>
    where
        H: CollectionHost<Vec<FlatItem<V>>> + ?Sized,
    {
        self.ensure_saveable()?;
        if self.staged.as_ref().is_some_and(|s| s.is_valid) {
            if let Some(staged) = self.staged.take() {
                self.push(staged.record);
            }
        }
        self.save(host)
    }

    /// Ends the session without emitting anything.
    pub fn cancel<H>(self, host: &mut H)
    where
        H: CollectionHost<Vec<FlatItem<V>>> + ?Sized,
    {
        debug!("flat editor cancelled");
        host.on_close();
    }

    /// Current list in external form.
    pub fn to_items(&self) -> Vec<FlatItem<V>> {
        self.items.iter().map(FlatNode::to_item).collect()
    }

    fn push(&mut self, record: Record<V>) {
        let rank = position_to_rank(self.items.len());
        self.items.push(FlatNode::new(record, rank));
        renumber_in_place(&mut self.items);
        debug!(count = self.items.len(), "added record");
    }

    fn key_at(&self, index: usize) -> Result<NodeKey, EditorError> {
        self.items
            .get(index)
            .map(FlatNode::key)
            .ok_or(EditorError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
    }

    fn ensure_saveable(&self) -> Result<(), EditorError> {
        if self.validation.all_valid() {
            Ok(())
        } else {
            let invalid = self.validation.invalid_count();
            warn!(invalid, "save blocked by invalid records");
            Err(EditorError::SaveBlocked { invalid })
        }
    }
}

impl<V: Clone + FieldValue> FlatEditor<V> {
    /// Validates the record at `index` against `fields` and records the result.
    pub fn validate_with<F>(
        &mut self,
        index: usize,
        fields: &FieldSet<V>,
        validator: &F,
    ) -> Result<RecordValidation, EditorError>
    where
        F: FieldValidator<V> + ?Sized,
    {
        let key = self.key_at(index)?;
        let record = self.items[index].record();
        let result = validate_record(fields, record, RecordPosition::Index(index), validator);
        self.validation.set_valid(key, result.is_valid());
        Ok(result)
    }

    /// Validates `record` and stages it with the outcome.
    pub fn stage_validated<F>(
        &mut self,
        record: Record<V>,
        fields: &FieldSet<V>,
        validator: &F,
    ) -> Result<RecordValidation, EditorError>
    where
        F: FieldValidator<V> + ?Sized,
    {
        let result = validate_record(fields, &record, RecordPosition::Staged, validator);
        self.stage_for_creation(record, result.is_valid())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::record::record_from_pairs;
    use crate::editor::host::RecordingHost;
    use serde_json::{json, Value};

    fn rec(name: &str) -> Record<Value> {
        record_from_pairs([("name", json!(name))])
    }

    fn names(editor: &FlatEditor<Value>) -> Vec<String> {
        editor
            .items()
            .iter()
            .map(|n| n.record()["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn ranks(editor: &FlatEditor<Value>) -> Vec<u32> {
        editor.items().iter().map(FlatNode::sort_idx).collect()
    }

    fn editor_with(names: &[&str]) -> FlatEditor<Value> {
        let items = names.iter().map(|n| FlatItem::new(rec(n))).collect();
        FlatEditor::open(items, EditorOptions::default())
    }

    #[test]
    fn test_open_assigns_missing_ranks_and_sorts() {
        let items = vec![
            FlatItem { sort_idx: Some(3), record: rec("c") },
            FlatItem::new(rec("x")),
            FlatItem { sort_idx: Some(1), record: rec("a") },
        ];
        // "x" takes its position (2) as rank
        let editor = FlatEditor::open(items, EditorOptions::default());
        assert_eq!(names(&editor), vec!["a", "x", "c"]);
        assert_eq!(ranks(&editor), vec![1, 2, 3]);
    }

    #[test]
    fn test_open_does_not_touch_caller_value() {
        let items = vec![FlatItem { sort_idx: Some(9), record: rec("a") }];
        let mut editor = FlatEditor::open(items.clone(), EditorOptions::default());
        editor.update(0, rec("changed")).unwrap();
        assert_eq!(items[0].record["name"], json!("a"));
        assert_eq!(items[0].sort_idx, Some(9));
    }

    #[test]
    fn test_add_appends_and_clears_staged() {
        let mut editor = editor_with(&["a"]);
        editor.stage_for_creation(rec("draft"), false).unwrap();
        editor.add(rec("b")).unwrap();
        assert_eq!(names(&editor), vec!["a", "b"]);
        assert_eq!(ranks(&editor), vec![1, 2]);
        assert!(editor.staged().is_none());
    }

    #[test]
    fn test_update_out_of_range_is_rejected() {
        let mut editor = editor_with(&["a", "b", "c"]);
        let err = editor.update(5, rec("z")).unwrap_err();
        assert_eq!(err, EditorError::IndexOutOfRange { index: 5, len: 3 });
        assert_eq!(names(&editor), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delete_renumbers_and_clears_validation() {
        let mut editor = editor_with(&["a", "b", "c"]);
        editor.set_valid(1, false).unwrap();
        assert!(!editor.all_valid());

        editor.delete(1).unwrap();
        assert_eq!(names(&editor), vec!["a", "c"]);
        assert_eq!(ranks(&editor), vec![1, 2]);
        assert!(editor.all_valid());
    }

    #[test]
    fn test_validity_follows_record_across_delete() {
        let mut editor = editor_with(&["a", "b", "c"]);
        editor.set_valid(2, false).unwrap();
        editor.delete(0).unwrap();
        // "c" moved from index 2 to 1 and keeps its flag
        assert_eq!(editor.is_valid_at(1), Some(false));
        assert_eq!(editor.is_valid_at(0), None);
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut editor = editor_with(&["a"]);
        assert!(editor.delete(1).is_err());
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn test_reorder_uses_display_position() {
        let mut editor = editor_with(&["a", "b", "c"]);
        assert!(editor.reorder(0, 3));
        assert_eq!(names(&editor), vec!["b", "c", "a"]);
        assert_eq!(ranks(&editor), vec![1, 2, 3]);
    }

    #[test]
    fn test_reorder_out_of_range_is_noop() {
        let mut editor = editor_with(&["a", "b"]);
        assert!(!editor.reorder(0, 3));
        assert!(!editor.reorder(0, 0));
        assert!(!editor.reorder(4, 1));
        assert_eq!(names(&editor), vec!["a", "b"]);
    }

    #[test]
    fn test_disabled_operations() {
        let options = EditorOptions {
            enable_sorting: false,
            disable_item_deletion: true,
            disable_item_creation: true,
        };
        let mut editor = FlatEditor::open(vec![FlatItem::new(rec("a")), FlatItem::new(rec("b"))], options);
        assert!(!editor.reorder(0, 2));
        assert_eq!(
            editor.delete(0),
            Err(EditorError::OperationDisabled(Operation::Deletion))
        );
        assert!(editor.add(rec("c")).is_err());
        assert!(editor.stage_for_creation(rec("c"), true).is_err());
        assert_eq!(names(&editor), vec!["a", "b"]);
    }

    #[test]
    fn test_save_blocked_while_invalid() {
        let mut editor = editor_with(&["a"]);
        editor.set_valid(0, false).unwrap();
        let mut host = RecordingHost::default();
        assert_eq!(
            editor.save(&mut host),
            Err(EditorError::SaveBlocked { invalid: 1 })
        );
        assert!(host.saved().is_empty());

        editor.set_valid(0, true).unwrap();
        assert!(editor.save(&mut host).is_ok());
        assert_eq!(host.saved().len(), 1);
    }

    #[test]
    fn test_save_excludes_staged() {
        let mut editor = editor_with(&["a"]);
        editor.stage_for_creation(rec("draft"), true).unwrap();
        let mut host = RecordingHost::default();
        let saved = editor.save(&mut host).unwrap();
        assert_eq!(saved.len(), 1);
        assert!(editor.staged().is_some());
    }

    #[test]
    fn test_save_and_add_commits_valid_staged() {
        let mut editor = editor_with(&["a"]);
        editor.stage_for_creation(rec("x"), true).unwrap();
        let mut host = RecordingHost::default();
        let saved = editor.save_and_add_staged(&mut host).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].record["name"], json!("x"));
        assert_eq!(saved[1].sort_idx, Some(2));
        assert!(editor.staged().is_none());
    }

    #[test]
    fn test_save_and_add_keeps_invalid_staged() {
        let mut editor = editor_with(&["a"]);
        editor.stage_for_creation(rec(""), false).unwrap();
        let mut host = RecordingHost::default();
        let saved = editor.save_and_add_staged(&mut host).unwrap();
        assert_eq!(saved.len(), 1);
        assert!(editor.staged().is_some());
    }

    #[test]
    fn test_async_validation_stale_result_ignored() {
        let mut editor = editor_with(&["a"]);
        let first = editor.begin_validation(0).unwrap();
        let second = editor.begin_validation(0).unwrap();
        assert!(editor.complete_validation(second, true));
        assert!(!editor.complete_validation(first, false));
        assert!(editor.all_valid());
    }

    #[test]
    fn test_cancel_notifies_host_without_payload() {
        let mut editor = editor_with(&["a"]);
        editor.add(rec("b")).unwrap();
        let mut host = RecordingHost::default();
        editor.cancel(&mut host);
        assert_eq!(host.close_count(), 1);
        assert!(host.saved().is_empty());
    }
}
