//! Delivery strategies.
//!
//! Every transport receives the same [`Delivery`]: composed headers and body
//! plus the envelope. Transports differ only in how they hand it over and in
//! a few composition settings (line ending, `Bcc` and `Subject` headers).

mod mail;
mod sendmail;
mod smtp;

pub use mail::{MailSubmit, MailTransport, Submission, SystemMail};
pub use sendmail::{SendmailTransport, sendmail_args};
pub use smtp::SmtpTransport;

use crate::config::{Config, Protocol};
use crate::error::Result;
use mailspool_mime::{ComposeOptions, Headers, LineEnding};
use mailspool_smtp::Transcript;

/// A composed message and its envelope, ready to be handed over.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Headers in wire order.
    pub headers: Headers,
    /// Body, using `line_ending` throughout.
    pub body: String,
    /// Q-encoded subject, for transports that pass it separately.
    pub subject: String,
    /// Envelope sender (bounce address).
    pub sender: String,
    /// Addressees shown to the recipient: the `To` list, or the single
    /// subscriber of a broadcast send.
    pub to: Vec<String>,
    /// Envelope recipients, including `Cc` and `Bcc`.
    pub recipients: Vec<String>,
    /// Line terminator used by `headers` and `body`.
    pub line_ending: LineEnding,
}

impl Delivery {
    /// Headers, a blank line and the body.
    #[must_use]
    pub fn payload(&self) -> String {
        let eol = self.line_ending.as_str();
        format!("{}{eol}{}", self.headers.render(eol), self.body)
    }
}

/// A way of handing a composed message to the outside world.
pub trait Transport {
    /// Adjusts the shared composition settings for this transport.
    fn compose_options(&self, base: ComposeOptions) -> ComposeOptions;

    /// Delivers one message, appending log lines to `transcript`.
    fn send(
        &self,
        delivery: &Delivery,
        transcript: &Transcript,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Transport selected at runtime from [`Config`].
#[derive(Debug, Clone)]
pub enum AnyTransport {
    /// Local mail submission.
    Mail(MailTransport),
    /// Piped sendmail.
    Sendmail(SendmailTransport),
    /// Direct SMTP.
    Smtp(SmtpTransport),
}

impl AnyTransport {
    /// Builds the transport named by `config.protocol`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings for that transport are
    /// incomplete.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(match config.protocol {
            Protocol::Mail => Self::Mail(MailTransport::new(SystemMail::new(&config.mailpath))),
            Protocol::Sendmail => Self::Sendmail(SendmailTransport::new(&config.mailpath)),
            Protocol::Smtp => Self::Smtp(SmtpTransport::new(config.smtp.clone())?),
        })
    }
}

impl Transport for AnyTransport {
    fn compose_options(&self, base: ComposeOptions) -> ComposeOptions {
        match self {
            Self::Mail(transport) => transport.compose_options(base),
            Self::Sendmail(transport) => transport.compose_options(base),
            Self::Smtp(transport) => transport.compose_options(base),
        }
    }

    async fn send(&self, delivery: &Delivery, transcript: &Transcript) -> Result<()> {
        match self {
            Self::Mail(transport) => transport.send(delivery, transcript).await,
            Self::Sendmail(transport) => transport.send(delivery, transcript).await,
            Self::Smtp(transport) => transport.send(delivery, transcript).await,
        }
    }
}
