//! Checks for addresses that end up on a command line.

use crate::error::{Error, Result};
use mailspool_mime::is_valid_mailbox;
use regex::Regex;
use std::sync::LazyLock;

/// Characters allowed in a sender passed as a program argument.
#[allow(clippy::expect_used)]
static SHELL_SAFE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A[a-z0-9._+-]+@[a-z0-9.-]{1,253}\z").expect("shell-safe pattern is valid")
});

/// Returns the ASCII form of `email` if it is safe to pass as `-f <sender>`.
///
/// The domain is converted with IDNA first; the result must be a valid
/// mailbox and consist only of `[a-z0-9._+-]` before and `[a-z0-9.-]` after
/// the `@`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the address is rejected.
pub fn shell_safe_sender(email: &str) -> Result<String> {
    let rejected = || Error::Validation(format!("{email:?} is not safe to pass to a shell"));

    let (local, domain) = email.rsplit_once('@').ok_or_else(rejected)?;
    let domain = idna::domain_to_ascii(domain).map_err(|_| rejected())?;
    let ascii = format!("{local}@{domain}");

    if is_valid_mailbox(&ascii) && SHELL_SAFE.is_match(&ascii) {
        Ok(ascii)
    } else {
        Err(rejected())
    }
}
