//! Collection file saving.
//!
//! Serializes a [`CollectionDocument`] as JSON or YAML (picked from the
//! target file name) and writes it atomically, optionally gzip-compressed and
//! with a `.bak` copy of the previous file.

use super::{is_gzipped, CollectionDocument, DocumentFormat};
use crate::config::Config;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Saves a collection document to a file.
///
/// # Examples
///
/// ```no_run
/// use treequill::config::Config;
/// use treequill::file::saver::save_collection_file;
/// use treequill::file::CollectionDocument;
///
/// let doc = CollectionDocument::Flat(Vec::new());
/// save_collection_file("out.yaml", &doc, &Config::default()).unwrap();
/// ```
///
/// # Atomic Write
///
/// The document is written to a temporary file next to the target, which is
/// then renamed over it, so the target is never left partially written.
pub fn save_collection_file<P: AsRef<Path>>(
    path: P,
    doc: &CollectionDocument,
    config: &Config,
) -> Result<()> {
    let path = path.as_ref();

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    let text = serialize_collection(doc, DocumentFormat::from_path(path), config.indent_size)?;
    write_file_atomic(path, text.as_bytes(), is_gzipped(path))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "saved collection");
    Ok(())
}

/// Serializes a document in the given format.
///
/// JSON output uses `indent_size` spaces per level and ends with a newline.
pub fn serialize_collection(
    doc: &CollectionDocument,
    format: DocumentFormat,
    indent_size: usize,
) -> Result<String> {
    match format {
        DocumentFormat::Json => {
            let indent = vec![b' '; indent_size];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut buf = Vec::new();
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            doc.serialize(&mut serializer)
                .context("Failed to serialize collection as JSON")?;
            let mut text = String::from_utf8(buf).context("Serialized JSON is not UTF-8")?;
            text.push('\n');
            Ok(text)
        }
        DocumentFormat::Yaml => {
            serde_yaml::to_string(doc).context("Failed to serialize collection as YAML")
        }
    }
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}
