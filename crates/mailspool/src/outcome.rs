//! Result of a send as reported to the caller.

use crate::error::Error;
use std::fmt;

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeError {
    /// SMTP reply code or mail program exit status, when there is one.
    pub code: Option<i32>,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// What happened during one call to [`crate::Mailer::send`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Whether every delivery succeeded.
    pub success: bool,
    /// Failures in the order they occurred.
    pub errors: Vec<OutcomeError>,
    /// Raw protocol and process log lines.
    pub log: Vec<String>,
}

impl Outcome {
    /// Records an error and marks the outcome as failed.
    pub fn record(&mut self, error: &Error) {
        self.success = false;
        self.errors.push(OutcomeError {
            code: error.code(),
            message: error.to_string(),
        });
    }

    /// Returns true if the send succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// First recorded error, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&OutcomeError> {
        self.errors.first()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn record_marks_failure() {
        let mut outcome = Outcome {
            success: true,
            ..Outcome::default()
        };
        outcome.record(&Error::from(mailspool_smtp::Error::protocol(
            550,
            "mailbox unavailable",
        )));

        assert!(!outcome.is_success());
        let error = outcome.first_error().unwrap();
        assert_eq!(error.code, Some(550));
        assert_eq!(error.to_string(), "[550] SMTP error 550: mailbox unavailable");
    }

    #[test]
    fn display_without_code() {
        let error = OutcomeError {
            code: None,
            message: "No recipients specified".into(),
        };
        assert_eq!(error.to_string(), "No recipients specified");
    }
}
