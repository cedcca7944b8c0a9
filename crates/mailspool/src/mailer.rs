//! Send orchestration.
//!
//! A [`Mailer`] composes a [`Message`] for its transport and delivers it
//! either once to every `To`/`Cc`/`Bcc` recipient or, when subscribers are
//! set, once per subscriber with a pause between successful sends.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::outcome::Outcome;
use crate::transport::{AnyTransport, Delivery, Transport};
use mailspool_mime::{ComposeOptions, Message, compose};
use mailspool_smtp::Transcript;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default pause between broadcast sends: 15 messages per minute.
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(4);

/// Composes messages and hands them to a [`Transport`].
#[derive(Debug, Clone)]
pub struct Mailer<T = AnyTransport> {
    transport: T,
    options: ComposeOptions,
    broadcast_interval: Duration,
}

impl Mailer<AnyTransport> {
    /// Builds a mailer with the transport and settings named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = AnyTransport::from_config(config)?;
        Ok(Self::new(transport)
            .with_compose_options(config.compose_options())
            .with_broadcast_interval(config.broadcast_interval()))
    }
}

impl<T: Transport> Mailer<T> {
    /// Wraps `transport` with default composition settings.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            options: ComposeOptions::default(),
            broadcast_interval: BROADCAST_INTERVAL,
        }
    }

    /// Replaces the shared composition settings.
    #[must_use]
    pub fn with_compose_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the pause between broadcast sends.
    #[must_use]
    pub const fn with_broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval = interval;
        self
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `message` and reports what happened.
    ///
    /// Never fails outright: errors are recorded in the returned
    /// [`Outcome`] together with the protocol log.
    pub async fn send(&self, message: &Message) -> Outcome {
        let transcript = Transcript::new();
        let result = self.deliver(message, &transcript).await;

        let mut outcome = Outcome {
            log: transcript.take(),
            ..Outcome::default()
        };
        match result {
            Ok(()) => outcome.success = true,
            Err(err) => {
                warn!(%err, "send failed");
                outcome.record(&err);
            }
        }
        outcome
    }

    async fn deliver(&self, message: &Message, transcript: &Transcript) -> Result<()> {
        match message.subscribers() {
            Some(subscribers) if !subscribers.is_empty() => {
                let recipients: Vec<String> = subscribers
                    .iter()
                    .map(|subscriber| subscriber.email().to_string())
                    .collect();
                self.broadcast(message, &recipients, transcript).await
            }
            _ => {
                let recipients: Vec<String> = message
                    .recipients()
                    .into_iter()
                    .map(|rcpt| rcpt.email().to_string())
                    .collect();
                if recipients.is_empty() {
                    return Err(Error::NoRecipients);
                }
                let to = message
                    .to()
                    .unwrap_or_default()
                    .iter()
                    .map(|rcpt| rcpt.email().to_string())
                    .collect();
                self.send_one(message, to, recipients, transcript).await
            }
        }
    }

    /// One send per subscriber, strictly in order. Stops at the first failure.
    async fn broadcast(
        &self,
        message: &Message,
        subscribers: &[String],
        transcript: &Transcript,
    ) -> Result<()> {
        let total = subscribers.len();
        for (index, subscriber) in subscribers.iter().enumerate() {
            debug!(subscriber = %subscriber, index, total, "broadcast send");
            let rcpt = vec![subscriber.clone()];
            self.send_one(message, rcpt.clone(), rcpt, transcript).await?;

            if index + 1 < total {
                debug!(interval = ?self.broadcast_interval, "pausing before next send");
                tokio::time::sleep(self.broadcast_interval).await;
            }
        }
        info!(total, "broadcast complete");
        Ok(())
    }

    async fn send_one(
        &self,
        message: &Message,
        to: Vec<String>,
        recipients: Vec<String>,
        transcript: &Transcript,
    ) -> Result<()> {
        let options = self.transport.compose_options(self.options.clone());
        let composed = compose(message, &options);
        let delivery = Delivery {
            headers: composed.headers,
            body: composed.body,
            subject: composed.subject,
            sender: message.return_path().to_string(),
            to,
            recipients,
            line_ending: options.line_ending,
        };
        self.transport.send(&delivery, transcript).await
    }
}
