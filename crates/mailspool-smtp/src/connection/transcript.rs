//! Shared log of raw protocol lines.

use std::sync::{Arc, Mutex, PoisonError};

/// Ordered record of the lines exchanged with a server.
///
/// Clones share the same buffer, so a caller can keep one handle while the
/// client writes through another. Client lines are prefixed `C: `, server
/// lines `S: `.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw line.
    pub fn record(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    /// Appends a line sent by the client.
    pub fn client(&self, line: &str) {
        self.record(format!("C: {line}"));
    }

    /// Appends a line received from the server.
    pub fn server(&self, line: &str) {
        self.record(format!("S: {line}"));
    }

    /// Returns a copy of every line recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns every line recorded so far.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of recorded lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
