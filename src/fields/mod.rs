//! Field descriptors and per-record validation.
//!
//! A [`FieldSet`] describes the fields shown for each record: their kind,
//! whether they are required, default values and dropdown options. Field sets
//! deserialize from the camelCase layout used by collection definitions:
//!
//! ```yaml
//! - id: title
//!   title: Title
//!   type: string
//!   required: true
//! - id: qty
//!   title: Quantity
//!   type: number
//!   defaultValue: 1
//!   deferredValidationTime: 500
//! ```
//!
//! [`validate_record`] runs the built-in checks for every field and then the
//! caller's [`FieldValidator`], producing one error message per failing field.

pub mod number;

use crate::document::node::NodeKey;
use crate::document::record::{FieldValue, Record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of editor a field uses. Only `Number`, `Boolean` and `Dropdown`
/// carry built-in checks; the others accept any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Dropdown,
    FabricIcon,
    Url,
    Custom,
    Color,
}

/// One selectable dropdown entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub key: serde_json::Value,
    #[serde(default)]
    pub text: String,
}

/// Describes one field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "V: Deserialize<'de>"))]
pub struct FieldDescriptor<V = serde_json::Value> {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disable_edit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<V>,
    /// Milliseconds to wait after the last keystroke before validating
    #[serde(
        default,
        rename = "deferredValidationTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub deferred_validation_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<DropdownOption>,
}

impl<V> FieldDescriptor<V> {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            kind,
            required: false,
            disable_edit: false,
            placeholder: None,
            default_value: None,
            deferred_validation_ms: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: V) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_options(mut self, options: Vec<DropdownOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_deferred_validation(mut self, ms: u64) -> Self {
        self.deferred_validation_ms = Some(ms);
        self
    }

    /// Validation delay for this field. An explicit setting, zero included,
    /// wins over `fallback`.
    pub fn validation_delay(&self, fallback: Duration) -> Duration {
        self.deferred_validation_ms
            .map(Duration::from_millis)
            .unwrap_or(fallback)
    }
}

/// Ordered list of field descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent, bound(deserialize = "V: Deserialize<'de>"))]
pub struct FieldSet<V = serde_json::Value> {
    fields: Vec<FieldDescriptor<V>>,
}

impl<V> FieldSet<V> {
    pub fn new(fields: Vec<FieldDescriptor<V>>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor<V>] {
        &self.fields
    }

    pub fn get(&self, id: &str) -> Option<&FieldDescriptor<V>> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<V: Clone> FieldSet<V> {
    /// Builds a record pre-filled with every field's default value.
    pub fn new_record(&self) -> Record<V> {
        self.fields
            .iter()
            .filter_map(|f| f.default_value.clone().map(|v| (f.id.clone(), v)))
            .collect()
    }
}

/// Where the record being validated lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPosition {
    /// Position in a flat collection
    Index(usize),
    /// Node in a tree collection
    Key(NodeKey),
    /// The record still being composed
    Staged,
}

/// Caller-supplied validation, run after the built-in checks pass.
///
/// Returning `None` or an empty message means the value is valid.
pub trait FieldValidator<V> {
    fn error_message(
        &self,
        field: &FieldDescriptor<V>,
        value: Option<&V>,
        position: RecordPosition,
        record: &Record<V>,
    ) -> Option<String>;
}

impl<V, F> FieldValidator<V> for F
where
    F: Fn(&FieldDescriptor<V>, Option<&V>, RecordPosition, &Record<V>) -> Option<String>,
{
    fn error_message(
        &self,
        field: &FieldDescriptor<V>,
        value: Option<&V>,
        position: RecordPosition,
        record: &Record<V>,
    ) -> Option<String> {
        self(field, value, position, record)
    }
}

/// Validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidator;

impl<V> FieldValidator<V> for NoValidator {
    fn error_message(
        &self,
        _field: &FieldDescriptor<V>,
        _value: Option<&V>,
        _position: RecordPosition,
        _record: &Record<V>,
    ) -> Option<String> {
        None
    }
}

/// Outcome of validating one record: an error message per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordValidation {
    errors: IndexMap<String, String>,
}

impl RecordValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Validates `record` against every field in `fields`.
pub fn validate_record<V, F>(
    fields: &FieldSet<V>,
    record: &Record<V>,
    position: RecordPosition,
    validator: &F,
) -> RecordValidation
where
    V: FieldValue,
    F: FieldValidator<V> + ?Sized,
{
    let mut result = RecordValidation::default();
    for field in fields.fields() {
        let value = record.get(&field.id);
        let message = builtin_check(field, value)
            .or_else(|| validator.error_message(field, value, position, record))
            .filter(|m| !m.is_empty());
        if let Some(message) = message {
            result.errors.insert(field.id.clone(), message);
        }
    }
    result
}

fn builtin_check<V: FieldValue>(field: &FieldDescriptor<V>, value: Option<&V>) -> Option<String> {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ if field.required => return Some(format!("{} is required", display_name(field))),
        _ => return None,
    };

    match field.kind {
        FieldKind::Number if value.to_number().is_none() => {
            Some(format!("{} must be a number", display_name(field)))
        }
        FieldKind::Boolean if value.to_flag().is_none() => {
            Some(format!("{} must be true or false", display_name(field)))
        }
        FieldKind::Dropdown if !field.options.is_empty() => {
            let key = value.to_option_key();
            let known = field
                .options
                .iter()
                .any(|o| key.is_some() && FieldValue::to_option_key(&o.key) == key);
            if known {
                None
            } else {
                Some(format!("{} has no option {}", display_name(field), key.unwrap_or_default()))
            }
        }
        _ => None,
    }
}

fn display_name<V>(field: &FieldDescriptor<V>) -> &str {
    if field.title.is_empty() {
        &field.id
    } else {
        &field.title
    }
}
