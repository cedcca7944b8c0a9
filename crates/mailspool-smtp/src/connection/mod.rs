//! SMTP connection management with type-state pattern.

mod client;
mod stream;
mod transcript;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, SmtpConnection,
};
pub use stream::{SmtpStream, connect, connect_tls, read_line_from};
pub use transcript::Transcript;

/// What the client knows about the server it talks to.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Whether the session runs over TLS negotiated with `STARTTLS`.
    pub tls: bool,
}
