//! The caller side of an editing session.
//!
//! An editor reports back through a [`CollectionHost`]: `on_save` receives
//! the cleaned value, `on_close` signals dismissal without a payload.

/// Receives the outcome of an editing session.
pub trait CollectionHost<T> {
    fn on_save(&mut self, value: T);
    fn on_close(&mut self);
}

/// A host that records everything it receives.
///
/// # Example
///
/// ```
/// use treequill::editor::host::{CollectionHost, RecordingHost};
///
/// let mut host = RecordingHost::default();
/// host.on_save(vec![1, 2]);
/// host.on_close();
/// assert_eq!(host.last_saved(), Some(&vec![1, 2]));
/// assert_eq!(host.close_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingHost<T> {
    saved: Vec<T>,
    closed: usize,
}

impl<T> RecordingHost<T> {
    pub fn saved(&self) -> &[T] {
        &self.saved
    }

    pub fn last_saved(&self) -> Option<&T> {
        self.saved.last()
    }

    pub fn take_saved(&mut self) -> Option<T> {
        self.saved.pop()
    }

    pub fn close_count(&self) -> usize {
        self.closed
    }
}

impl<T> Default for RecordingHost<T> {
    fn default() -> Self {
        Self {
            saved: Vec::new(),
            closed: 0,
        }
    }
}

impl<T> CollectionHost<T> for RecordingHost<T> {
    fn on_save(&mut self, value: T) {
        self.saved.push(value);
    }

    fn on_close(&mut self) {
        self.closed += 1;
    }
}
