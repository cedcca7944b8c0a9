//! Direct SMTP delivery.

use super::{Delivery, Transport};
use crate::config::{Encryption, SmtpConfig};
use crate::error::{Error, Result};
use mailspool_mime::{ComposeOptions, LineEnding};
use mailspool_smtp::connection::{connect, connect_tls};
use mailspool_smtp::{Address, Client, Connected, MailTransaction, Transcript};
use std::net::IpAddr;
use tracing::{debug, info};

/// Delivers by talking SMTP to a server, one session per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpTransport {
    config: SmtpConfig,
    host: String,
}

impl SmtpTransport {
    /// Creates a transport for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no host is configured.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::Configuration("SMTP host is not configured".into()))?
            .to_string();
        Ok(Self { config, host })
    }

    /// Server settings.
    #[must_use]
    pub const fn config(&self) -> &SmtpConfig {
        &self.config
    }

    async fn open(&self, transcript: &Transcript) -> Result<Client<Connected>> {
        let timeout = self.config.timeout();
        let stream = match self.config.encryption {
            Encryption::Ssl => connect_tls(&self.host, self.config.port, timeout).await?,
            Encryption::None | Encryption::Tls => {
                connect(&self.host, self.config.port, timeout).await?
            }
        };
        let client = Client::from_stream(stream, transcript.clone()).await?;

        let helo = self.helo_domain(&client)?;
        let client = match self.config.encryption {
            Encryption::Tls => client.starttls(&self.host, &helo).await?,
            Encryption::None | Encryption::Ssl => client.helo(&helo).await?,
        };
        Ok(client)
    }

    async fn begin(&self, client: Client<Connected>, from: Address) -> Result<Client<MailTransaction>> {
        let client = match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                client
                    .auth_login(username, password)
                    .await?
                    .mail_from(from)
                    .await?
            }
            _ => client.mail_from(from).await?,
        };
        Ok(client)
    }

    /// Name announced with `HELO`.
    fn helo_domain<S>(&self, client: &Client<S>) -> Result<String> {
        if let Some(domain) = &self.config.helo_domain {
            return Ok(domain.clone());
        }
        if let Ok(name) = gethostname::gethostname().into_string()
            && name.contains('.')
        {
            return Ok(name);
        }
        Ok(address_literal(client.local_addr()?.ip()))
    }
}

/// RFC 5321 address literal: `[192.0.2.1]` or `[IPv6:2001:db8::1]`.
fn address_literal(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(ip) => format!("[{ip}]"),
        IpAddr::V6(ip) => format!("[IPv6:{ip}]"),
    }
}

impl Transport for SmtpTransport {
    fn compose_options(&self, base: ComposeOptions) -> ComposeOptions {
        ComposeOptions {
            include_bcc: true,
            include_subject: true,
            line_ending: LineEnding::Crlf,
            ..base
        }
    }

    async fn send(&self, delivery: &Delivery, transcript: &Transcript) -> Result<()> {
        let from = Address::new(delivery.sender.as_str())?;
        let recipients = delivery
            .recipients
            .iter()
            .map(|rcpt| Address::new(rcpt.as_str()))
            .collect::<mailspool_smtp::Result<Vec<_>>>()?;
        let Some((first, rest)) = recipients.split_first() else {
            return Err(Error::NoRecipients);
        };

        let client = self.open(transcript).await?;
        let client = self.begin(client, from).await?;

        let notify = self.config.dsn;
        let mut client = client.rcpt_to(first.clone(), notify).await?;
        for rcpt in rest {
            client = client.rcpt_to(rcpt.clone(), notify).await?;
        }

        let client = client.data().await?;
        let client = client.send_message(delivery.payload().as_bytes()).await?;
        client.quit().await?;

        info!(
            host = %self.host,
            recipients = delivery.recipients.len(),
            "message accepted"
        );
        debug!(lines = transcript.len(), "session closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn requires_host() {
        assert!(matches!(
            SmtpTransport::new(SmtpConfig::default()),
            Err(Error::Configuration(_))
        ));
        let config = SmtpConfig {
            host: Some("  ".into()),
            ..SmtpConfig::default()
        };
        assert!(SmtpTransport::new(config).is_err());
    }

    #[test]
    fn address_literals() {
        assert_eq!(
            address_literal(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))),
            "[192.0.2.1]"
        );
        assert_eq!(
            address_literal(IpAddr::V6(Ipv6Addr::LOCALHOST)),
            "[IPv6:::1]"
        );
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let transport = SmtpTransport::new(SmtpConfig {
            host: Some("127.0.0.1".into()),
            port: 9,
            ..SmtpConfig::default()
        })
        .unwrap();
        let delivery = Delivery {
            headers: mailspool_mime::Headers::new(),
            body: String::new(),
            subject: String::new(),
            sender: "sender@example.com".into(),
            to: vec!["bad address@example.com".into()],
            recipients: vec!["bad address@example.com".into()],
            line_ending: LineEnding::Crlf,
        };
        let transcript = Transcript::new();
        let err = transport.send(&delivery, &transcript).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Smtp(mailspool_smtp::Error::InvalidAddress(_))
        ));
        assert!(transcript.is_empty());
    }
}
