//! Subscriber broadcasts: one send per subscriber, paced, stopping on failure.

#![allow(clippy::unwrap_used)]

use mailspool::mime::{Address, ComposeOptions, Message};
use mailspool::smtp::Transcript;
use mailspool::{Delivery, Error, Mailer, Result, Transport};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Records each delivery with the time it happened; fails the send at
/// `fail_at` (zero-based) if set.
#[derive(Debug, Default)]
struct Recorder {
    fail_at: Option<usize>,
    sends: Mutex<Vec<(Instant, Vec<String>)>>,
}

impl Recorder {
    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    fn sends(&self) -> Vec<(Instant, Vec<String>)> {
        self.sends.lock().unwrap().clone()
    }
}

impl Transport for Recorder {
    fn compose_options(&self, base: ComposeOptions) -> ComposeOptions {
        base
    }

    async fn send(&self, delivery: &Delivery, transcript: &Transcript) -> Result<()> {
        let mut sends = self.sends.lock().unwrap();
        let index = sends.len();
        sends.push((Instant::now(), delivery.recipients.clone()));
        transcript.record(format!("send {index}"));

        if self.fail_at == Some(index) {
            return Err(Error::Transport {
                status: Some(75),
                message: "temporary failure".into(),
            });
        }
        Ok(())
    }
}

/// Paused time advances in whole timer ticks; allow one tick of slack.
fn assert_about(actual: Duration, expected: Duration) {
    let tick = Duration::from_millis(1);
    assert!(
        actual >= expected && actual <= expected + tick,
        "expected about {expected:?}, got {actual:?}"
    );
}

fn address(email: &str) -> Address {
    Address::new(email).unwrap()
}

fn newsletter() -> Message {
    Message::builder(address("news@example.com"))
        .to(address("ignored@example.com"))
        .subject("Issue 12")
        .html_body("<p>Hello</p>")
        .subscriber(address("a@example.com"))
        .subscriber(address("b@example.com"))
        .subscriber(address("c@example.com"))
        .build()
}

#[tokio::test(start_paused = true)]
async fn pauses_between_sends_but_not_after_last() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mailer = Mailer::new(Recorder::default());
    let start = Instant::now();
    let outcome = mailer.send(&newsletter()).await;

    assert!(outcome.is_success());
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.log, vec!["send 0", "send 1", "send 2"]);

    let sends = mailer.transport().sends();
    let recipients: Vec<_> = sends.iter().map(|(_, rcpt)| rcpt.clone()).collect();
    assert_eq!(
        recipients,
        vec![
            vec!["a@example.com".to_string()],
            vec!["b@example.com".to_string()],
            vec!["c@example.com".to_string()],
        ]
    );

    // Two pauses of four seconds, none after the third send.
    assert_about(sends[1].0 - sends[0].0, Duration::from_secs(4));
    assert_about(sends[2].0 - sends[1].0, Duration::from_secs(4));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn failure_stops_the_broadcast() {
    let mailer = Mailer::new(Recorder::failing_at(1));
    let start = Instant::now();
    let outcome = mailer.send(&newsletter()).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, Some(75));
    assert_eq!(mailer.transport().sends().len(), 2);
    assert_about(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn interval_is_configurable() {
    let mailer =
        Mailer::new(Recorder::default()).with_broadcast_interval(Duration::from_secs(1));
    let start = Instant::now();
    assert!(mailer.send(&newsletter()).await.is_success());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn without_subscribers_sends_to_recipients() {
    let message = Message::builder(address("news@example.com"))
        .to(address("to@example.com"))
        .build();
    let mailer = Mailer::new(Recorder::default());
    assert!(mailer.send(&message).await.is_success());
    assert_eq!(
        mailer.transport().sends()[0].1,
        vec!["to@example.com".to_string()]
    );
}

#[tokio::test]
async fn no_recipients_is_an_error() {
    let message = Message::builder(address("news@example.com")).build();
    let mailer = Mailer::new(Recorder::default());

    let outcome = mailer.send(&message).await;
    assert!(!outcome.is_success());
    assert!(mailer.transport().sends().is_empty());
    assert_eq!(outcome.first_error().unwrap().message, "No recipients specified");
}
