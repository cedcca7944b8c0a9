//! # mailspool-smtp
//!
//! The SMTP client used by `mailspool` to deliver one message per session.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   SMTP state transitions
//! - **Strict replies**: every step expects one reply code; anything else
//!   aborts the session without `QUIT`
//! - **TLS support**: Both implicit TLS (port 465) and STARTTLS
//! - **Authentication**: AUTH LOGIN
//! - **Delivery status notifications**: optional `NOTIFY=` on `RCPT TO`
//! - **Transcript**: every raw line exchanged, with credentials masked
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use mailspool_smtp::{Address, Client, Transcript};
//! use mailspool_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailspool_smtp::Result<()> {
//!     let transcript = Transcript::new();
//!     let stream = connect("smtp.example.com", 587, Duration::from_secs(5)).await?;
//!     let client = Client::from_stream(stream, transcript.clone()).await?;
//!
//!     let client = client.starttls("smtp.example.com", "client.example.com").await?;
//!     let client = client.auth_login("user@example.com", "password").await?;
//!
//!     let client = client.mail_from(Address::new("sender@example.com")?).await?;
//!     let client = client.rcpt_to(Address::new("recipient@example.com")?, false).await?;
//!     let client = client.data().await?;
//!
//!     let client = client.send_message(b"Subject: Test\r\n\r\nHello, World!\r\n").await?;
//!     client.quit().await?;
//!
//!     for line in transcript.lines() {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_login() ───→ Authenticated
//! └──────────────┘                            │
//!        │                                    │
//!        └─── mail_from() ───→ MailTransaction ───→ RecipientAdded ───→ Data
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Reply parser
//! - [`types`]: Core SMTP types (addresses, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpConnection, Transcript,
};
pub use error::{Error, Result};
pub use types::{Address, Reply, ReplyClass, ReplyCode};
