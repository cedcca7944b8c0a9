//! Mailbox address type.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// RFC 5322 dot-atom local part and hostname domain (or bracketed IPv4 literal).
#[allow(clippy::expect_used)]
static MAILBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \A
        [A-Za-z0-9!\#$%&'*+/=?^_`{|}~-]+ (?: \. [A-Za-z0-9!\#$%&'*+/=?^_`{|}~-]+ )*
        @
        (?:
            (?: [\p{L}\p{N}] (?: [\p{L}\p{N}-]{0,61} [\p{L}\p{N}] )? \. )+
            [\p{L}\p{N}] (?: [\p{L}\p{N}-]{0,61} [\p{L}\p{N}] )?
          | \[ \d{1,3} (?: \. \d{1,3} ){3} \]
          | [\p{L}\p{N}] (?: [\p{L}\p{N}-]{0,61} [\p{L}\p{N}] )?
        )
        \z",
    )
    .expect("mailbox pattern is valid")
});

/// Returns true if `email` is a syntactically valid bare mailbox (`local@domain`).
#[must_use]
pub fn is_valid_mailbox(email: &str) -> bool {
    email.len() <= 254 && MAILBOX.is_match(email)
}

/// An email address with an optional display name.
///
/// Immutable once built; formats as `"Name" <email>` when a name is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    email: String,
    name: Option<String>,
}

impl Address {
    /// Creates an address without display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox fails syntax validation.
    pub fn new(email: impl Into<String>) -> Result<Self> {
        let email = email.into().trim().to_string();
        if !is_valid_mailbox(&email) {
            return Err(Error::InvalidAddress(email));
        }
        Ok(Self { email, name: None })
    }

    /// Creates an address with a display name.
    ///
    /// An empty name is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox fails syntax validation or the name
    /// contains a line break.
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let mut address = Self::new(email)?;
        let name = name.into().trim().to_string();
        if name.contains(['\r', '\n']) {
            return Err(Error::InvalidAddress(format!(
                "display name contains a line break: {name:?}"
            )));
        }
        address.name = (!name.is_empty()).then_some(name);
        Ok(address)
    }

    /// Returns the bare mailbox.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.email)
            }
            None => f.write_str(&self.email),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses either a bare mailbox or `Name <mailbox>`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match (s.rfind('<'), s.ends_with('>')) {
            (Some(open), true) => {
                let email = &s[open + 1..s.len() - 1];
                let name = s[..open].trim().trim_matches('"');
                Self::with_name(email, name)
            }
            _ => Self::new(s),
        }
    }
}
