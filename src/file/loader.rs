//! Collection file loading.
//!
//! Reads a JSON or YAML document (optionally gzip-compressed) and turns it
//! into a [`CollectionDocument`]. The shape is detected from the content
//! unless the caller forces one:
//!
//! - a sequence of records is a flat collection
//! - a mapping with `value` or `children` is a tree
//! - a sequence whose first element has `children` is a tree forest; only its
//!   first root is kept

use super::{is_gzipped, CollectionDocument, CollectionKind, DocumentFormat};
use crate::document::node::{FlatItem, TreeItem};
use crate::fields::FieldSet;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads and parses a collection file from the filesystem.
///
/// # Examples
///
/// ```no_run
/// use treequill::file::loader::load_collection_file;
///
/// let doc = load_collection_file("rules.yaml", None).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read or decompressed
/// - The contents are not valid JSON/YAML
/// - The contents do not have the requested (or any recognizable) shape
pub fn load_collection_file<P: AsRef<Path>>(
    path: P,
    kind: Option<CollectionKind>,
) -> Result<CollectionDocument> {
    let path_ref = path.as_ref();

    let content = if is_gzipped(path_ref) {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read {}", path_ref.display()))?
    };

    parse_collection(&content, DocumentFormat::from_path(path_ref), kind)
}

/// Loads a collection from standard input. The text is read as YAML, which
/// also accepts JSON; gzip input is detected by its magic bytes.
pub fn load_collection_from_stdin(kind: Option<CollectionKind>) -> Result<CollectionDocument> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in stdin")?
    };

    parse_collection(&content, DocumentFormat::Yaml, kind)
}

/// Parses collection text in the given format.
pub fn parse_collection(
    content: &str,
    format: DocumentFormat,
    kind: Option<CollectionKind>,
) -> Result<CollectionDocument> {
    let value: Value = match format {
        DocumentFormat::Json => serde_json::from_str(content).context("Failed to parse JSON")?,
        DocumentFormat::Yaml => serde_yaml::from_str(content).context("Failed to parse YAML")?,
    };
    document_from_value(value, kind)
}

/// Converts an already parsed value into a collection document.
pub fn document_from_value(value: Value, kind: Option<CollectionKind>) -> Result<CollectionDocument> {
    let kind = match kind {
        Some(kind) => kind,
        None => detect_kind(&value)?,
    };

    match kind {
        CollectionKind::Flat => flat_from_value(value).map(CollectionDocument::Flat),
        CollectionKind::Tree => tree_from_value(value).map(CollectionDocument::Tree),
    }
}

/// Guesses the collection shape from a parsed document.
pub fn detect_kind(value: &Value) -> Result<CollectionKind> {
    match value {
        Value::Null => Ok(CollectionKind::Flat),
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) if first.contains_key("children") => Ok(CollectionKind::Tree),
            _ => Ok(CollectionKind::Flat),
        },
        Value::Object(map) if map.contains_key("children") || map.contains_key("value") => {
            Ok(CollectionKind::Tree)
        }
        _ => anyhow::bail!("Document is neither a list of records nor a tree"),
    }
}

fn flat_from_value(value: Value) -> Result<Vec<FlatItem<Value>>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value(item)
                    .with_context(|| format!("Item {} is not a record", idx + 1))
            })
            .collect(),
        _ => anyhow::bail!("A flat collection must be a list of records"),
    }
}

fn tree_from_value(value: Value) -> Result<TreeItem<Value>> {
    let root = match value {
        Value::Null => return Ok(TreeItem::new(Default::default())),
        Value::Array(mut roots) => {
            if roots.len() > 1 {
                tracing::warn!(roots = roots.len(), "tree has several roots; keeping the first");
            }
            if roots.is_empty() {
                return Ok(TreeItem::new(Default::default()));
            }
            roots.swap_remove(0)
        }
        other => other,
    };
    serde_json::from_value(root).context("Tree root is not a valid tree node")
}

/// Loads a field set: a JSON or YAML list of field descriptors.
pub fn load_field_set<P: AsRef<Path>>(path: P) -> Result<FieldSet> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read {}", path_ref.display()))?;
    let fields: Result<FieldSet> = match DocumentFormat::from_path(path_ref) {
        DocumentFormat::Json => serde_json::from_str(&content).map_err(Into::into),
        DocumentFormat::Yaml => serde_yaml::from_str(&content).map_err(Into::into),
    };
    fields.with_context(|| format!("Invalid field set in {}", path_ref.display()))
}

/// Reads and decompresses a gzipped file.
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

/// Decompresses gzip-encoded bytes to a UTF-8 string.
fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped stdin")?;
    Ok(content)
}
