//! Error types for sending mail.

use thiserror::Error;

/// Errors that can occur while sending a message.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// SMTP session failed.
    #[error(transparent)]
    Smtp(#[from] mailspool_smtp::Error),

    /// Message could not be composed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailspool_mime::Error),

    /// The mail program failed to start or exited unsuccessfully.
    #[error("Transport error: {message}")]
    Transport {
        /// Exit status of the mail program, if it ran.
        status: Option<i32>,
        /// What went wrong.
        message: String,
    },

    /// Address rejected by validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Message has neither recipients nor subscribers.
    #[error("No recipients specified")]
    NoRecipients,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Numeric code recorded with this error: the SMTP reply code or the
    /// mail program's exit status.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Smtp(err) => err.code().map(i32::from),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
