//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream, Transcript};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, Reply, ReplyCode};
use base64::Engine;
use std::marker::PhantomData;
use std::net::SocketAddr;
use tracing::{debug, trace};

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
///
/// Every step checks the reply code it expects. On a mismatch the step
/// returns an error and consumes the client, which closes the socket
/// without `QUIT`.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    transcript: Transcript,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns the protocol log shared with the caller.
    fn transcript(&self) -> &Transcript;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the greeting is not `220`, or an
    /// I/O error if it cannot be read.
    pub async fn from_stream(mut stream: SmtpStream, transcript: Transcript) -> Result<Self> {
        let greeting = read_reply(&mut stream, &transcript).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::Connection {
                code: greeting.code.as_u16(),
                message: greeting.message_text(),
            });
        }

        // Extract hostname from greeting (first word after code)
        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!(server = %hostname, "connected");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                tls: false,
            },
            transcript,
            _state: PhantomData,
        })
    }

    /// Sends `HELO`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `250`.
    pub async fn helo(mut self, domain: &str) -> Result<Self> {
        self.command(
            &Command::Helo {
                hostname: domain.to_string(),
            },
            &[ReplyCode::OK],
        )
        .await?;
        Ok(self)
    }

    /// Upgrades the connection with `STARTTLS`.
    ///
    /// Sends `HELO`, then `STARTTLS`, performs the handshake against
    /// `tls_hostname` and greets again, since the session state resets once
    /// TLS is up.
    ///
    /// # Errors
    ///
    /// Returns an error if any step is rejected or the handshake fails.
    pub async fn starttls(mut self, tls_hostname: &str, helo_domain: &str) -> Result<Self> {
        let helo = Command::Helo {
            hostname: helo_domain.to_string(),
        };
        self.command(&helo, &[ReplyCode::OK]).await?;
        // RFC 3207 specifies 220; some servers answer 250.
        self.command(&Command::StartTls, &[ReplyCode::SERVICE_READY, ReplyCode::OK])
            .await?;

        self.stream = self.stream.upgrade_to_tls(tls_hostname).await?;
        self.server_info.tls = true;
        self.transcript.record("-- TLS established --");
        debug!(host = tls_hostname, "TLS established");

        self.command(&helo, &[ReplyCode::OK]).await?;
        Ok(self)
    }

    /// Authenticates with `AUTH LOGIN`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] unless the server answers `334`,
    /// `334` and finally `235`.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let engine = base64::engine::general_purpose::STANDARD;
        let steps = [
            (Command::AuthLogin, ReplyCode::AUTH_CONTINUE),
            (
                Command::AuthResponse {
                    encoded: engine.encode(username.as_bytes()),
                },
                ReplyCode::AUTH_CONTINUE,
            ),
            (
                Command::AuthResponse {
                    encoded: engine.encode(password.as_bytes()),
                },
                ReplyCode::AUTH_SUCCESS,
            ),
        ];

        for (cmd, expected) in &steps {
            self.command(cmd, &[*expected])
                .await
                .map_err(authentication_error)?;
        }
        debug!("authenticated");

        Ok(self.transition())
    }

    /// Starts a mail transaction without authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `250`.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.command(&Command::MailFrom { from }, &[ReplyCode::OK])
            .await?;
        Ok(self.transition())
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `250`.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.command(&Command::MailFrom { from }, &[ReplyCode::OK])
            .await?;
        Ok(self.transition())
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient, optionally requesting delivery status
    /// notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `250`.
    pub async fn rcpt_to(mut self, to: Address, notify: bool) -> Result<Client<RecipientAdded>> {
        self.command(&Command::RcptTo { to, notify }, &[ReplyCode::OK])
            .await?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `250`.
    pub async fn rcpt_to(mut self, to: Address, notify: bool) -> Result<Self> {
        self.command(&Command::RcptTo { to, notify }, &[ReplyCode::OK])
            .await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `354`.
    pub async fn data(mut self) -> Result<Client<Data>> {
        self.command(&Command::Data, &[ReplyCode::START_DATA])
            .await?;
        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends the message and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is added.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the server does not accept the
    /// message with `250`.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        let payload = encode_data(message);
        self.transcript
            .client(&format!("<{} bytes of message data>", message.len()));
        self.transcript.client(".");
        trace!(bytes = payload.len(), "C: message data");
        self.stream.write_all(&payload).await?;

        let reply = read_reply(&mut self.stream, &self.transcript).await?;
        expect(reply, &[ReplyCode::OK])?;
        debug!("message accepted");

        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    /// Local address of the connection, used for an address-literal `HELO`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is no longer connected.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.local_addr()
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            transcript: self.transcript,
            _state: PhantomData,
        }
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        self.transcript.client(&cmd.to_string());
        trace!("C: {cmd}");
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream, &self.transcript).await
    }

    async fn command(&mut self, cmd: &Command, expected: &[ReplyCode]) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        expect(reply, expected)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer `221`.
    pub async fn quit(mut self) -> Result<()> {
        self.command(&Command::Quit, &[ReplyCode::CLOSING]).await?;
        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream, transcript: &Transcript) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        transcript.server(&line);
        trace!("S: {line}");
        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

fn expect(reply: Reply, expected: &[ReplyCode]) -> Result<Reply> {
    if expected.contains(&reply.code) {
        Ok(reply)
    } else {
        Err(Error::protocol(reply.code.as_u16(), reply.message_text()))
    }
}

fn authentication_error(err: Error) -> Error {
    match err {
        Error::Protocol { code, message } => Error::Authentication { code, message },
        other => other,
    }
}

/// CRLF-normalized, dot-stuffed message followed by the end-of-data line.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    let message = message.strip_suffix(b"\n").unwrap_or(message);

    for line in message.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            payload.push(b'.');
        }
        payload.extend_from_slice(line);
        payload.extend_from_slice(b"\r\n");
    }

    payload.extend_from_slice(b".\r\n");
    payload
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_data_normalizes_and_terminates() {
        assert_eq!(encode_data(b"a\nb\r\nc"), b"a\r\nb\r\nc\r\n.\r\n");
        assert_eq!(encode_data(b"a\r\n"), b"a\r\n.\r\n");
    }

    #[test]
    fn test_encode_data_dot_stuffing() {
        assert_eq!(
            encode_data(b"Subject: x\r\n\r\n.\r\n..two\r\nmid.dot"),
            b"Subject: x\r\n\r\n..\r\n...two\r\nmid.dot\r\n.\r\n"
        );
    }

    #[test]
    fn test_expect() {
        let ok = Reply::new(ReplyCode::OK, vec!["ok".into()]);
        assert!(expect(ok, &[ReplyCode::OK]).is_ok());

        let rejected = Reply::new(ReplyCode::MAILBOX_UNAVAILABLE, vec!["no".into()]);
        let err = expect(rejected, &[ReplyCode::OK]).unwrap_err();
        assert!(matches!(err, Error::Protocol { code: 550, ref message } if message == "no"));
    }

    #[test]
    fn test_authentication_error_mapping() {
        let err = authentication_error(Error::protocol(535, "bad credentials"));
        assert!(matches!(err, Error::Authentication { code: 535, .. }));

        let err = authentication_error(Error::InvalidReply("x".into()));
        assert!(matches!(err, Error::InvalidReply(_)));
    }
}
