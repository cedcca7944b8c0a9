//! # mailspool
//!
//! Compose email and deliver it through a local `mail` submission, a piped
//! `sendmail` program or a direct SMTP session.
//!
//! This crate provides:
//! - Configuration loaded from TOML
//! - The [`Transport`] trait and its three strategies
//! - [`Mailer`], which composes per send and paces subscriber broadcasts
//! - [`Outcome`], the per-send success flag, error list and protocol log
//! - Shell-safety validation of envelope senders
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailspool::{Config, Mailer};
//! use mailspool::mime::{Address, Message};
//!
//! let config = Config::from_toml_str(r#"
//!     protocol = "smtp"
//!     [smtp]
//!     host = "smtp.example.com"
//! "#)?;
//! let mailer = Mailer::from_config(&config)?;
//!
//! let message = Message::builder(Address::new("news@example.com")?)
//!     .to(Address::new("reader@example.com")?)
//!     .subject("Weekly digest")
//!     .html_body("<p>Hello</p>")
//!     .build();
//!
//! let outcome = mailer.send(&message).await;
//! if !outcome.is_success() {
//!     for error in &outcome.errors {
//!         eprintln!("{error}");
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod mailer;
pub mod outcome;
pub mod transport;
pub mod validate;

pub use mailspool_mime as mime;
pub use mailspool_smtp as smtp;

pub use config::{Config, Encryption, Protocol, SmtpConfig};
pub use error::{Error, Result};
pub use mailer::{BROADCAST_INTERVAL, Mailer};
pub use outcome::{Outcome, OutcomeError};
pub use transport::{
    AnyTransport, Delivery, MailSubmit, MailTransport, SendmailTransport, SmtpTransport,
    Submission, SystemMail, Transport,
};
pub use validate::shell_safe_sender;
