//! Mailer configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration that delivers through the local `mail` transport.
//!
//! ```toml
//! protocol = "smtp"
//! user_agent = "newsletter/2.1"
//! wordwrap = 76
//!
//! [smtp]
//! host = "smtp.example.com"
//! port = 587
//! encryption = "tls"
//! username = "mailer@example.com"
//! password = "secret"
//! ```

use crate::error::{Error, Result};
use mailspool_mime::ComposeOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delivery mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Local mail submission: `To` and `Subject` go to the submission
    /// call, recipients are passed as arguments.
    #[default]
    Mail,
    /// Pipe into a sendmail-compatible program with explicit recipients.
    Sendmail,
    /// Talk SMTP to a server directly.
    Smtp,
}

/// Encryption mode for SMTP connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// Plain text.
    #[default]
    None,
    /// Implicit TLS (connect directly with TLS).
    Ssl,
    /// STARTTLS upgrade after plaintext connect.
    Tls,
}

/// SMTP server configuration.
///
/// `Debug` output never shows the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname; required for the SMTP transport.
    pub host: Option<String>,
    /// Server port.
    pub port: u16,
    /// Encryption mode.
    pub encryption: Encryption,
    /// Username for AUTH LOGIN; authentication is skipped when absent.
    pub username: Option<String>,
    /// Password for AUTH LOGIN.
    pub password: Option<String>,
    /// Connect timeout in seconds.
    pub timeout_secs: u64,
    /// Request delivery status notifications for every recipient.
    pub dsn: bool,
    /// Name sent with HELO instead of the local host name.
    pub helo_domain: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 25,
            encryption: Encryption::None,
            username: None,
            password: None,
            timeout_secs: 5,
            dsn: false,
            helo_domain: None,
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encryption", &self.encryption)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("timeout_secs", &self.timeout_secs)
            .field("dsn", &self.dsn)
            .field("helo_domain", &self.helo_domain)
            .finish()
    }
}

impl SmtpConfig {
    /// Connect timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transport to use.
    pub protocol: Protocol,
    /// `User-Agent` and `X-Mailer` header value.
    pub user_agent: String,
    /// Column limit for plain-text bodies.
    pub wordwrap: Option<usize>,
    /// Send HTML as `multipart/alternative`.
    pub multipart: bool,
    /// Mail program used by the `mail` and `sendmail` transports.
    pub mailpath: PathBuf,
    /// Pause between broadcast sends, in seconds.
    pub broadcast_interval_secs: u64,
    /// SMTP settings.
    pub smtp: SmtpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: Protocol::Mail,
            user_agent: "mailspool".to_string(),
            wordwrap: None,
            multipart: true,
            mailpath: PathBuf::from("/usr/sbin/sendmail"),
            broadcast_interval_secs: 4,
            smtp: SmtpConfig::default(),
        }
    }
}

impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the document is malformed or fails
    /// [`Config::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| Error::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))
    }

    /// Checks settings the selected transport depends on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when SMTP is selected without a host,
    /// or when a username is given without a password.
    pub fn validate(&self) -> Result<()> {
        if self.protocol == Protocol::Smtp
            && self.smtp.host.as_deref().is_none_or(|host| host.trim().is_empty())
        {
            return Err(Error::Configuration(
                "smtp.host is required when protocol is smtp".into(),
            ));
        }
        if self.smtp.username.is_some() && self.smtp.password.is_none() {
            return Err(Error::Configuration(
                "smtp.password is required when smtp.username is set".into(),
            ));
        }
        if self.wordwrap == Some(0) {
            return Err(Error::Configuration("wordwrap must be positive".into()));
        }
        Ok(())
    }

    /// Pause between broadcast sends.
    #[must_use]
    pub const fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.broadcast_interval_secs)
    }

    /// Composition settings shared by every transport.
    #[must_use]
    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            user_agent: self.user_agent.clone(),
            multipart: self.multipart,
            wordwrap: self.wordwrap,
            ..ComposeOptions::default()
        }
    }
}
