//! Scripted edit commands.
//!
//! A script is a YAML (or JSON) list of commands replayed against an editor,
//! the way interactive callbacks would drive it:
//!
//! ```yaml
//! - op: add
//!   record: { name: a }
//! - op: reorder
//!   from: 0
//!   to: 2
//! - op: save
//! ```
//!
//! Tree commands address nodes by their positional path from the root
//! (`[]` is the root, `[0, 1]` the second child of the first child). Paths
//! are resolved against the tree as it stands when the command runs.
//!
//! `save` and `cancel` end the session; commands after them are not run.

use crate::document::node::NodeKey;
use crate::document::record::Record;
use crate::editor::flat::FlatEditor;
use crate::editor::host::RecordingHost;
use crate::editor::tree::TreeEditor;
use crate::editor::EditorOptions;
use crate::fields::{FieldSet, NoValidator};
use crate::file::CollectionDocument;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// One scripted edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum EditCommand {
    Add {
        record: Record<Value>,
    },
    Update {
        index: usize,
        record: Record<Value>,
    },
    Delete {
        index: usize,
    },
    Reorder {
        from: usize,
        /// 1-based display position
        to: usize,
    },
    Stage {
        record: Record<Value>,
        #[serde(default = "default_true")]
        valid: bool,
    },
    SaveAndAdd,
    SetValid {
        index: usize,
        valid: bool,
    },
    AddChild {
        #[serde(default)]
        parent: Vec<usize>,
        record: Record<Value>,
    },
    RemoveChild {
        path: Vec<usize>,
    },
    UpdateNode {
        path: Vec<usize>,
        record: Record<Value>,
    },
    ReorderChildren {
        #[serde(default)]
        parent: Vec<usize>,
        from: usize,
        /// 1-based display position
        to: usize,
    },
    SetNodeValid {
        path: Vec<usize>,
        valid: bool,
    },
    Save,
    Cancel,
}

fn default_true() -> bool {
    true
}

impl EditCommand {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::Add { .. } => "add",
            EditCommand::Update { .. } => "update",
            EditCommand::Delete { .. } => "delete",
            EditCommand::Reorder { .. } => "reorder",
            EditCommand::Stage { .. } => "stage",
            EditCommand::SaveAndAdd => "save-and-add",
            EditCommand::SetValid { .. } => "set-valid",
            EditCommand::AddChild { .. } => "add-child",
            EditCommand::RemoveChild { .. } => "remove-child",
            EditCommand::UpdateNode { .. } => "update-node",
            EditCommand::ReorderChildren { .. } => "reorder-children",
            EditCommand::SetNodeValid { .. } => "set-node-valid",
            EditCommand::Save => "save",
            EditCommand::Cancel => "cancel",
        }
    }
}

/// Parses a command script from YAML or JSON text.
pub fn parse_script(content: &str) -> Result<Vec<EditCommand>> {
    let commands: Option<Vec<EditCommand>> =
        serde_yaml::from_str(content).context("Failed to parse command script")?;
    Ok(commands.unwrap_or_default())
}

/// How an editing session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// `save` or `save-and-add` emitted this document
    Saved(CollectionDocument),
    /// `cancel` closed the session
    Cancelled,
    /// The script ended with the session still open
    Open,
}

/// Summary of a script run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptReport {
    pub applied: usize,
    pub skipped: usize,
    pub outcome: SessionOutcome,
}

/// Runs `commands` against a fresh editor for `doc`.
///
/// With `fields`, every record is validated on open and again after each
/// command that changes it, so `save` is blocked while any record is invalid.
pub fn run_script(
    doc: CollectionDocument,
    commands: &[EditCommand],
    options: EditorOptions,
    fields: Option<&FieldSet>,
) -> Result<ScriptReport> {
    match doc {
        CollectionDocument::Flat(items) => {
            let mut editor = FlatEditor::open(items, options);
            if let Some(fields) = fields {
                for index in 0..editor.len() {
                    editor.validate_with(index, fields, &NoValidator)?;
                }
            }
            run_flat(editor, commands, fields)
        }
        CollectionDocument::Tree(root) => {
            let mut editor = TreeEditor::open(Some(root), options);
            if let Some(fields) = fields {
                let root_key = editor.root_key();
                let keys = editor.tree().root().subtree_keys();
                for key in keys {
                    if key != root_key {
                        editor.validate_with(key, fields, &NoValidator);
                    }
                }
            }
            run_tree(editor, commands, fields)
        }
    }
}

fn run_flat(
    mut editor: FlatEditor<Value>,
    commands: &[EditCommand],
    fields: Option<&FieldSet>,
) -> Result<ScriptReport> {
    let mut host = RecordingHost::default();
    let mut applied = 0;
    let mut skipped = 0;

    for (n, command) in commands.iter().enumerate() {
        let step = || format!("command {} ({})", n + 1, command.name());
        let changed = match command {
            EditCommand::Add { record } => {
                editor.add(record.clone()).with_context(step)?;
                if let Some(fields) = fields {
                    editor.validate_with(editor.len() - 1, fields, &NoValidator)?;
                }
                true
            }
            EditCommand::Update { index, record } => {
                editor.update(*index, record.clone()).with_context(step)?;
                if let Some(fields) = fields {
                    editor.validate_with(*index, fields, &NoValidator)?;
                }
                true
            }
            EditCommand::Delete { index } => {
                editor.delete(*index).with_context(step)?;
                true
            }
            EditCommand::Reorder { from, to } => editor.reorder(*from, *to),
            EditCommand::Stage { record, valid } => {
                match fields {
                    Some(fields) => {
                        editor
                            .stage_validated(record.clone(), fields, &NoValidator)
                            .with_context(step)?;
                    }
                    None => editor
                        .stage_for_creation(record.clone(), *valid)
                        .with_context(step)?,
                }
                true
            }
            EditCommand::SetValid { index, valid } => {
                editor.set_valid(*index, *valid).with_context(step)?;
                true
            }
            EditCommand::SaveAndAdd => {
                let saved = editor.save_and_add_staged(&mut host).with_context(step)?;
                return Ok(finish(applied + 1, skipped, commands.len() - n - 1, flat_saved(saved)));
            }
            EditCommand::Save => {
                let saved = editor.save(&mut host).with_context(step)?;
                return Ok(finish(applied + 1, skipped, commands.len() - n - 1, flat_saved(saved)));
            }
            EditCommand::Cancel => {
                editor.cancel(&mut host);
                return Ok(finish(applied + 1, skipped, commands.len() - n - 1, SessionOutcome::Cancelled));
            }
            other => {
                warn!(op = other.name(), "tree command ignored for a flat collection");
                false
            }
        };
        tally(changed, &step, &mut applied, &mut skipped);
    }

    Ok(finish(applied, skipped, 0, SessionOutcome::Open))
}

fn run_tree(
    mut editor: TreeEditor<Value>,
    commands: &[EditCommand],
    fields: Option<&FieldSet>,
) -> Result<ScriptReport> {
    let mut host = RecordingHost::default();
    let mut applied = 0;
    let mut skipped = 0;

    for (n, command) in commands.iter().enumerate() {
        let step = || format!("command {} ({})", n + 1, command.name());
        let changed = match command {
            EditCommand::AddChild { parent, record } => {
                let added = resolve(&editor, parent)
                    .and_then(|parent_key| editor.add_child(parent_key, record.clone()));
                if let (Some(key), Some(fields)) = (added, fields) {
                    editor.validate_with(key, fields, &NoValidator);
                }
                added.is_some()
            }
            EditCommand::RemoveChild { path } => match path.split_last() {
                Some((_, parent_path)) => {
                    match (resolve(&editor, path), resolve(&editor, parent_path)) {
                        (Some(key), Some(parent_key)) => editor.remove_child(key, parent_key),
                        _ => false,
                    }
                }
                None => false,
            },
            EditCommand::UpdateNode { path, record } => {
                let updated = resolve(&editor, path)
                    .filter(|key| editor.update_node(*key, record.clone()));
                if let (Some(key), Some(fields)) = (updated, fields) {
                    editor.validate_with(key, fields, &NoValidator);
                }
                updated.is_some()
            }
            EditCommand::ReorderChildren { parent, from, to } => resolve(&editor, parent)
                .is_some_and(|parent_key| editor.reorder_children(parent_key, *from, *to)),
            EditCommand::SetNodeValid { path, valid } => resolve(&editor, path)
                .is_some_and(|key| editor.set_valid(key, *valid)),
            EditCommand::Save => {
                let saved = editor.save(&mut host).with_context(step)?;
                let outcome = SessionOutcome::Saved(CollectionDocument::Tree(saved));
                return Ok(finish(applied + 1, skipped, commands.len() - n - 1, outcome));
            }
            EditCommand::Cancel => {
                editor.cancel(&mut host);
                return Ok(finish(applied + 1, skipped, commands.len() - n - 1, SessionOutcome::Cancelled));
            }
            other => {
                warn!(op = other.name(), "flat command ignored for a tree collection");
                false
            }
        };
        tally(changed, &step, &mut applied, &mut skipped);
    }

    Ok(finish(applied, skipped, 0, SessionOutcome::Open))
}

fn tally(changed: bool, step: impl Fn() -> String, applied: &mut usize, skipped: &mut usize) {
    if changed {
        *applied += 1;
    } else {
        warn!(step = %step(), "command had no effect");
        *skipped += 1;
    }
}

fn resolve(editor: &TreeEditor<Value>, path: &[usize]) -> Option<NodeKey> {
    editor.tree().key_at_path(path)
}

fn flat_saved(items: Vec<crate::document::node::FlatItem<Value>>) -> SessionOutcome {
    SessionOutcome::Saved(CollectionDocument::Flat(items))
}

fn finish(applied: usize, skipped: usize, unrun: usize, outcome: SessionOutcome) -> ScriptReport {
    if unrun > 0 {
        warn!(unrun, "commands after the end of the session were not run");
    }
    info!(applied, skipped, "script finished");
    ScriptReport {
        applied,
        skipped,
        outcome,
    }
}
