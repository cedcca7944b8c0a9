//! Local mail submission.

use super::sendmail::{checked_sender, run_mail_program, sendmail_args};
use super::{Delivery, Transport};
use crate::error::Result;
use mailspool_mime::{ComposeOptions, LineEnding};
use mailspool_smtp::Transcript;
use std::path::{Path, PathBuf};

/// `To` value when every recipient is hidden.
const UNDISCLOSED: &str = "undisclosed-recipients:;";

/// What the local submission primitive receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Comma-separated addressees, written as the `To` header.
    pub to: String,
    /// Envelope recipients, including hidden ones.
    pub recipients: Vec<String>,
    /// Encoded subject, written as the `Subject` header.
    pub subject: String,
    /// Remaining headers, already rendered.
    pub headers: String,
    /// Message body.
    pub body: String,
    /// Envelope sender, if it passed shell-safety validation.
    pub sender: Option<String>,
    /// Line terminator of `headers` and `body`.
    pub line_ending: LineEnding,
}

impl Submission {
    /// The message as the primitive writes it: `To`, `Subject`, the other
    /// headers, a blank line and the body.
    #[must_use]
    pub fn message(&self) -> String {
        let eol = self.line_ending.as_str();
        format!(
            "To: {}{eol}Subject: {}{eol}{}{eol}{}",
            self.to, self.subject, self.headers, self.body
        )
    }
}

/// The platform's mail submission primitive.
pub trait MailSubmit: Sync {
    /// Hands one message over for delivery.
    fn submit(
        &self,
        submission: &Submission,
        transcript: &Transcript,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Submits through the system `sendmail`.
///
/// Recipients go on the command line rather than being parsed from the
/// headers with `-t`, so `Bcc` addresses reach the envelope without ever
/// appearing in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMail {
    mailpath: PathBuf,
}

impl Default for SystemMail {
    fn default() -> Self {
        Self::new("/usr/sbin/sendmail")
    }
}

impl SystemMail {
    /// Uses the program at `mailpath`.
    #[must_use]
    pub fn new(mailpath: impl AsRef<Path>) -> Self {
        Self {
            mailpath: mailpath.as_ref().to_path_buf(),
        }
    }
}

impl MailSubmit for SystemMail {
    async fn submit(&self, submission: &Submission, transcript: &Transcript) -> Result<()> {
        let args = sendmail_args(submission.sender.as_deref(), &submission.recipients);
        run_mail_program(
            &self.mailpath,
            &args,
            submission.message().as_bytes(),
            transcript,
        )
        .await
    }
}

/// Delivers through a [`MailSubmit`] primitive.
///
/// The primitive writes `To` and `Subject` itself, so those headers are not
/// composed into the header block.
#[derive(Debug, Clone, Default)]
pub struct MailTransport<S = SystemMail> {
    submitter: S,
}

impl<S: MailSubmit> MailTransport<S> {
    /// Wraps a submission primitive.
    pub const fn new(submitter: S) -> Self {
        Self { submitter }
    }

    /// The wrapped primitive.
    pub const fn submitter(&self) -> &S {
        &self.submitter
    }
}

impl<S: MailSubmit> Transport for MailTransport<S> {
    fn compose_options(&self, base: ComposeOptions) -> ComposeOptions {
        ComposeOptions {
            include_bcc: false,
            include_subject: false,
            line_ending: LineEnding::Crlf,
            ..base
        }
    }

    async fn send(&self, delivery: &Delivery, transcript: &Transcript) -> Result<()> {
        let mut headers = delivery.headers.clone();
        headers.remove("To");
        headers.remove("Subject");

        let to = if delivery.to.is_empty() {
            UNDISCLOSED.to_string()
        } else {
            delivery.to.join(", ")
        };
        let submission = Submission {
            to,
            recipients: delivery.recipients.clone(),
            subject: delivery.subject.clone(),
            headers: headers.render(delivery.line_ending.as_str()),
            body: delivery.body.clone(),
            sender: checked_sender(&delivery.sender, transcript),
            line_ending: delivery.line_ending,
        };
        self.submitter.submit(&submission, transcript).await
    }
}
