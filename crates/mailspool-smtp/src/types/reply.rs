//! Server replies.

use std::fmt;

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit status.
    pub code: ReplyCode,
    /// Text of each line with the code and separator removed.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Whether the server completed the request (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code.class(), ReplyClass::Completed)
    }

    /// All lines joined with `\n`, as recorded in errors.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message_text().replace('\n', " / "))
    }
}

/// First digit of a reply code (RFC 5321 section 4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// 2xx: the request was carried out.
    Completed,
    /// 3xx: more input is expected (`DATA`, `AUTH` challenges).
    Intermediate,
    /// 4xx: temporary failure; the same request may succeed later.
    Transient,
    /// 5xx: the request will not succeed as issued.
    Permanent,
    /// Anything outside 2xx..5xx.
    Unknown,
}

/// Three-digit SMTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 greeting / ready to start TLS.
    pub const SERVICE_READY: Self = Self(220);
    /// 221 answer to `QUIT`.
    pub const CLOSING: Self = Self(221);
    /// 235 `AUTH` accepted.
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 request completed.
    pub const OK: Self = Self(250);
    /// 334 `AUTH` challenge.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 send message data.
    pub const START_DATA: Self = Self(354);
    /// 421 server is shutting the channel.
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 535 credentials rejected.
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 mailbox unavailable.
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 554 transaction failed.
    pub const TRANSACTION_FAILED: Self = Self(554);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Reads the code at the start of a reply line: exactly three ASCII
    /// digits.
    #[must_use]
    pub fn parse(digits: &str) -> Option<Self> {
        let bytes = digits.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_digit) {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    /// The numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Class given by the first digit.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completed,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Unknown,
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}
