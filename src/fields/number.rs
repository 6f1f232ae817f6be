//! Debounced numeric field input.
//!
//! Keystrokes update the displayed value immediately; validation of the new
//! value is deferred until typing pauses for the field's validation delay.
//! Disposing the input defuses any pending validation.

use super::FieldDescriptor;
use crate::editor::debounce::Debouncer;
use std::time::{Duration, Instant};

/// Default pause before a numeric field is validated.
pub const DEFAULT_VALIDATION_DELAY: Duration = Duration::from_millis(200);

/// Parses raw keystroke text into a number.
///
/// Accepts integers and finite decimals. Text that starts with an integer
/// followed by other characters yields that leading integer, so `"12abc"` is
/// `12`. Blank or non-numeric text yields `None`.
///
/// # Example
///
/// ```
/// use treequill::fields::number::parse_number_input;
///
/// assert_eq!(parse_number_input("42"), Some(42.0));
/// assert_eq!(parse_number_input(" -3.5 "), Some(-3.5));
/// assert_eq!(parse_number_input("12abc"), Some(12.0));
/// assert_eq!(parse_number_input("abc"), None);
/// ```
pub fn parse_number_input(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n as f64);
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return Some(n);
        }
    }

    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, c)| sign_len + i + c.len_utf8())?;
    trimmed[..digits].parse::<i64>().ok().map(|n| n as f64)
}

/// A validation that became due.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberValidationRequest {
    pub field_id: String,
    pub value: Option<f64>,
}

/// State of one numeric field while it is being edited.
#[derive(Debug, Clone)]
pub struct NumberFieldInput {
    field_id: String,
    raw: String,
    value: Option<f64>,
    error: Option<String>,
    pending: Debouncer<(), Option<f64>>,
}

impl NumberFieldInput {
    /// Opens an input for `field`, seeded from `initial`.
    ///
    /// The initial value is scheduled for validation like any keystroke.
    pub fn open<V>(
        field: &FieldDescriptor<V>,
        initial: Option<f64>,
        fallback_delay: Duration,
        now: Instant,
    ) -> Self {
        let mut input = Self {
            field_id: field.id.clone(),
            raw: initial.map(format_number).unwrap_or_default(),
            value: initial,
            error: None,
            pending: Debouncer::new(field.validation_delay(fallback_delay)),
        };
        input.pending.schedule((), initial, now);
        input
    }

    /// Handles a keystroke: the value changes now, validation later.
    pub fn input(&mut self, raw: &str, now: Instant) -> Option<f64> {
        self.raw = raw.to_string();
        self.value = parse_number_input(raw);
        self.pending.schedule((), self.value, now);
        self.value
    }

    /// Returns the validation request if the pause has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<NumberValidationRequest> {
        self.pending
            .due(now)
            .pop()
            .map(|((), value)| NumberValidationRequest {
                field_id: self.field_id.clone(),
                value,
            })
    }

    /// Records the outcome of a validation. Empty messages clear the error.
    pub fn set_error(&mut self, message: Option<String>) {
        self.error = message.filter(|m| !m.is_empty());
    }

    /// Defuses pending validation. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.pending.defuse();
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn has_pending_validation(&self) -> bool {
        self.pending.pending_count() > 0
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
