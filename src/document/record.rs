//! Records: the opaque field bags that users edit.
//!
//! A record maps field ids to values. The editors never look inside a value;
//! only the field validators in [`crate::fields`] need the small
//! [`FieldValue`] view defined here.
//!
//! # Example
//!
//! ```
//! use treequill::document::record::{record_from_pairs, FieldValue};
//! use serde_json::json;
//!
//! let record = record_from_pairs([("name", json!("Alice")), ("age", json!(30))]);
//! assert_eq!(record.len(), 2);
//! assert_eq!(record["age"].to_number(), Some(30.0));
//! assert!(!record["name"].is_blank());
//! ```

use indexmap::IndexMap;

/// An insertion-ordered mapping of field id to value.
pub type Record<V> = IndexMap<String, V>;

/// Builds a record from `(field id, value)` pairs, keeping their order.
pub fn record_from_pairs<V, K, I>(pairs: I) -> Record<V>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// The read-only view of a field value that built-in field checks rely on.
pub trait FieldValue {
    /// Returns true for "no value": null, empty or whitespace-only text.
    fn is_blank(&self) -> bool;

    /// Returns the value as a number if it is one, or is text holding one.
    fn to_number(&self) -> Option<f64>;

    /// Returns the value as a boolean if it is one.
    fn to_flag(&self) -> Option<bool>;

    /// Returns a textual form suitable for comparing against option keys.
    fn to_option_key(&self) -> Option<String>;
}

impl FieldValue for serde_json::Value {
    fn is_blank(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn to_number(&self) -> Option<f64> {
        match self {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn to_flag(&self) -> Option<bool> {
        serde_json::Value::as_bool(self)
    }

    fn to_option_key(&self) -> Option<String> {
        match self {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
