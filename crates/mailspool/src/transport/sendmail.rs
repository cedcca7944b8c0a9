//! Piped delivery through a sendmail-compatible program.

use super::{Delivery, Transport};
use crate::error::{Error, Result};
use crate::validate::shell_safe_sender;
use mailspool_mime::{ComposeOptions, LineEnding};
use mailspool_smtp::Transcript;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Arguments for `sendmail`: `-oi`, `-f <sender>` when given, then the
/// recipients after `--`.
#[must_use]
pub fn sendmail_args(sender: Option<&str>, recipients: &[String]) -> Vec<String> {
    let mut args = vec!["-oi".to_string()];
    if let Some(sender) = sender {
        args.push("-f".to_string());
        args.push(sender.to_string());
    }
    args.push("--".to_string());
    args.extend(recipients.iter().cloned());
    args
}

/// Writes the message into a sendmail-compatible program.
///
/// Recipients are passed as arguments, so the program does not parse them
/// from the headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendmailTransport {
    mailpath: PathBuf,
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new("/usr/sbin/sendmail")
    }
}

impl SendmailTransport {
    /// Uses the program at `mailpath`.
    #[must_use]
    pub fn new(mailpath: impl AsRef<Path>) -> Self {
        Self {
            mailpath: mailpath.as_ref().to_path_buf(),
        }
    }

    /// Path of the mail program.
    #[must_use]
    pub fn mailpath(&self) -> &Path {
        &self.mailpath
    }
}

impl Transport for SendmailTransport {
    fn compose_options(&self, base: ComposeOptions) -> ComposeOptions {
        ComposeOptions {
            include_bcc: false,
            include_subject: true,
            line_ending: LineEnding::Lf,
            ..base
        }
    }

    async fn send(&self, delivery: &Delivery, transcript: &Transcript) -> Result<()> {
        let sender = checked_sender(&delivery.sender, transcript);
        let args = sendmail_args(sender.as_deref(), &delivery.recipients);
        run_mail_program(
            &self.mailpath,
            &args,
            delivery.payload().as_bytes(),
            transcript,
        )
        .await
    }
}

/// Envelope sender if it may be passed as `-f`; otherwise logs and returns
/// `None` so the program falls back to its default sender.
pub(crate) fn checked_sender(sender: &str, transcript: &Transcript) -> Option<String> {
    match shell_safe_sender(sender) {
        Ok(sender) => Some(sender),
        Err(err) => {
            warn!(%err, "omitting -f; the mail program will use its default sender");
            transcript.record(format!("envelope sender rejected, -f omitted: {err}"));
            None
        }
    }
}

/// Spawns `program` with `args`, writes `payload` to its input and waits for
/// it to exit.
pub(crate) async fn run_mail_program(
    program: &Path,
    args: &[String],
    payload: &[u8],
    transcript: &Transcript,
) -> Result<()> {
    transcript.record(format!("$ {} {}", program.display(), args.join(" ")));
    debug!(program = %program.display(), ?args, "starting mail program");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Transport {
            status: None,
            message: format!("failed to start {}: {e}", program.display()),
        })?;

    let stdin = child.stdin.take();
    let write = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(payload).await?;
            stdin.shutdown().await?;
        }
        Ok::<(), io::Error>(())
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;

    transcript.record(format!("{} bytes written, {}", payload.len(), output.status));
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        transcript.record(format!("stderr: {line}"));
    }

    if !output.status.success() {
        return Err(Error::Transport {
            status: output.status.code(),
            message: format!("{} exited with {}", program.display(), output.status),
        });
    }
    // A program that exits successfully without reading its input has
    // still accepted the message.
    match written {
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err.into()),
        _ => Ok(()),
    }
}
