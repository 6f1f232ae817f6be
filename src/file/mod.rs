//! File I/O for collection documents.
//!
//! This module loads flat or tree collections from JSON/YAML files or stdin,
//! and saves them back with atomic writes and optional backups.

pub mod loader;
pub mod saver;

use crate::document::node::{FlatItem, TreeItem};
use serde::Serialize;
use std::path::Path;

/// Shape of a collection document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Flat,
    Tree,
}

/// Text format of a collection document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from the file name, ignoring a trailing `.gz`.
    ///
    /// `.json` selects JSON; everything else is read as YAML, which also
    /// accepts JSON input.
    ///
    /// # Example
    ///
    /// ```
    /// use treequill::file::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path("rules.json.gz"), DocumentFormat::Json);
    /// assert_eq!(DocumentFormat::from_path("rules.yaml"), DocumentFormat::Yaml);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let base = path_str.strip_suffix(".gz").unwrap_or(&path_str);
        if base.ends_with(".json") {
            DocumentFormat::Json
        } else {
            DocumentFormat::Yaml
        }
    }
}

/// A loaded collection, ready to open in the matching editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CollectionDocument {
    Flat(Vec<FlatItem<serde_json::Value>>),
    Tree(TreeItem<serde_json::Value>),
}

impl CollectionDocument {
    pub fn kind(&self) -> CollectionKind {
        match self {
            CollectionDocument::Flat(_) => CollectionKind::Flat,
            CollectionDocument::Tree(_) => CollectionKind::Tree,
        }
    }
}

/// Returns true if `path` names a gzip-compressed file.
pub(crate) fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}
