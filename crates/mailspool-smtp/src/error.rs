//! Error types for SMTP operations.

use crate::types::{ReplyClass, ReplyCode};
use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, including the server closing the connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Connecting took longer than the configured timeout.
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// Server greeting was not `220`.
    #[error("Connection rejected {code}: {message}")]
    Connection {
        /// Reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// An `AUTH LOGIN` step was answered with an unexpected code.
    #[error("Authentication failed {code}: {message}")]
    Authentication {
        /// Reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// A command was answered with an unexpected code.
    #[error("SMTP error {code}: {message}")]
    Protocol {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// A reply line could not be parsed.
    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    /// Invalid envelope address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Host name not usable for TLS.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),
}

impl Error {
    /// Creates a protocol error from a reply code and message.
    #[must_use]
    pub fn protocol(code: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Returns the server reply code carried by this error, if any.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Connection { code, .. }
            | Self::Authentication { code, .. }
            | Self::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn class(&self) -> Option<ReplyClass> {
        self.code().map(|code| ReplyCode::new(code).class())
    }

    /// Returns true if the server rejected the request for good (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.class() == Some(ReplyClass::Permanent)
    }

    /// Returns true if the same request may succeed later (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == Some(ReplyClass::Transient)
    }
}
