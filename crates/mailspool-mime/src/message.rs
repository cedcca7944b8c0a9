//! Outgoing message model.

use crate::address::Address;
use crate::attachment::Attachment;
use crate::header::{field_name, strip_line_breaks};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    #[default]
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Body content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    /// `text/plain`
    #[default]
    Plain,
    /// `text/html`
    Html,
}

/// An outgoing email message.
///
/// Built once through [`MessageBuilder`] and read-only afterwards. Recipient
/// lists distinguish "not set" (`None`) from "set but empty".
#[derive(Debug, Clone)]
pub struct Message {
    from: Address,
    to: Option<Vec<Address>>,
    cc: Option<Vec<Address>>,
    bcc: Option<Vec<Address>>,
    reply_to: Option<Address>,
    subject: String,
    body: String,
    alt_body: String,
    content_type: ContentType,
    charset: String,
    encoding: TransferEncoding,
    priority: Option<u8>,
    return_path: Option<String>,
    attachments: Option<Vec<Attachment>>,
    subscribers: Option<Vec<Address>>,
    headers: Vec<(String, String)>,
}

impl Message {
    /// MIME version emitted in the `Mime-Version` header.
    pub const MIME_VERSION: &'static str = "1.0";

    /// Starts building a message from `from`.
    #[must_use]
    pub fn builder(from: Address) -> MessageBuilder {
        MessageBuilder::new(from)
    }

    /// Sender.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// `To` recipients, if set.
    #[must_use]
    pub fn to(&self) -> Option<&[Address]> {
        self.to.as_deref()
    }

    /// `Cc` recipients, if set.
    #[must_use]
    pub fn cc(&self) -> Option<&[Address]> {
        self.cc.as_deref()
    }

    /// `Bcc` recipients, if set.
    #[must_use]
    pub fn bcc(&self) -> Option<&[Address]> {
        self.bcc.as_deref()
    }

    /// Reply address; falls back to the sender.
    #[must_use]
    pub fn reply_to(&self) -> &Address {
        self.reply_to.as_ref().unwrap_or(&self.from)
    }

    /// Subject as given (not encoded).
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Main body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Plain-text alternative for HTML mail (may be empty).
    #[must_use]
    pub fn alt_body(&self) -> &str {
        &self.alt_body
    }

    /// Body content type.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Character set of the text parts.
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Declared transfer encoding for plain-text parts.
    #[must_use]
    pub const fn encoding(&self) -> TransferEncoding {
        self.encoding
    }

    /// Priority (1 = highest, 5 = lowest), if set.
    #[must_use]
    pub const fn priority(&self) -> Option<u8> {
        self.priority
    }

    /// Return path; falls back to the sender mailbox.
    #[must_use]
    pub fn return_path(&self) -> &str {
        self.return_path.as_deref().unwrap_or_else(|| self.from.email())
    }

    /// Attachments, if set.
    #[must_use]
    pub fn attachments(&self) -> Option<&[Attachment]> {
        self.attachments.as_deref()
    }

    /// Broadcast subscribers, if set.
    #[must_use]
    pub fn subscribers(&self) -> Option<&[Address]> {
        self.subscribers.as_deref()
    }

    /// Caller-supplied extra headers, in insertion order.
    pub fn custom_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Every envelope recipient: `to`, then `cc`, then `bcc`.
    #[must_use]
    pub fn recipients(&self) -> Vec<&Address> {
        [&self.to, &self.cc, &self.bcc]
            .into_iter()
            .flatten()
            .flatten()
            .collect()
    }
}

/// Builder for [`Message`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    /// Creates a builder with UTF-8 plain text defaults.
    #[must_use]
    pub fn new(from: Address) -> Self {
        Self {
            message: Message {
                from,
                to: None,
                cc: None,
                bcc: None,
                reply_to: None,
                subject: String::new(),
                body: String::new(),
                alt_body: String::new(),
                content_type: ContentType::Plain,
                charset: "UTF-8".to_string(),
                encoding: TransferEncoding::EightBit,
                priority: None,
                return_path: None,
                attachments: None,
                subscribers: None,
                headers: Vec::new(),
            },
        }
    }

    /// Adds a `To` recipient.
    #[must_use]
    pub fn to(mut self, address: Address) -> Self {
        self.message.to.get_or_insert_with(Vec::new).push(address);
        self
    }

    /// Adds a `Cc` recipient.
    #[must_use]
    pub fn cc(mut self, address: Address) -> Self {
        self.message.cc.get_or_insert_with(Vec::new).push(address);
        self
    }

    /// Adds a `Bcc` recipient.
    #[must_use]
    pub fn bcc(mut self, address: Address) -> Self {
        self.message.bcc.get_or_insert_with(Vec::new).push(address);
        self
    }

    /// Sets the reply address.
    #[must_use]
    pub fn reply_to(mut self, address: Address) -> Self {
        self.message.reply_to = Some(address);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.message.subject = subject.into();
        self
    }

    /// Sets a plain-text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.message.body = body.into();
        self.message.content_type = ContentType::Plain;
        self
    }

    /// Sets an HTML body.
    #[must_use]
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.message.body = body.into();
        self.message.content_type = ContentType::Html;
        self
    }

    /// Sets the plain-text alternative for an HTML body.
    #[must_use]
    pub fn alt_body(mut self, alt_body: impl Into<String>) -> Self {
        self.message.alt_body = alt_body.into();
        self
    }

    /// Sets the character set. Line breaks are dropped.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.message.charset = strip_line_breaks(&charset.into());
        self
    }

    /// Sets the declared transfer encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: TransferEncoding) -> Self {
        self.message.encoding = encoding;
        self
    }

    /// Sets the priority, clamped to 1..=5.
    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.message.priority = Some(priority.clamp(1, 5));
        self
    }

    /// Sets the return path. Line breaks are dropped.
    ///
    /// The value is not required to be a valid mailbox: transports check it
    /// again before using it as an envelope sender.
    #[must_use]
    pub fn return_path(mut self, return_path: impl Into<String>) -> Self {
        self.message.return_path = Some(strip_line_breaks(return_path.into().trim()));
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.message
            .attachments
            .get_or_insert_with(Vec::new)
            .push(attachment);
        self
    }

    /// Adds a broadcast subscriber.
    #[must_use]
    pub fn subscriber(mut self, address: Address) -> Self {
        self.message
            .subscribers
            .get_or_insert_with(Vec::new)
            .push(address);
        self
    }

    /// Adds an extra header.
    ///
    /// Line breaks are dropped from the value; the name keeps only printable
    /// ASCII other than `:`. A header whose name ends up empty is ignored.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = field_name(&name.into());
        if name.is_empty() {
            return self;
        }
        self.message
            .headers
            .push((name, strip_line_breaks(&value.into())));
        self
    }

    /// Finishes the message.
    #[must_use]
    pub fn build(self) -> Message {
        self.message
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn addr(email: &str) -> Address {
        Address::new(email).unwrap()
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("base64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::EightBit.to_string(), "8bit");
    }

    #[test]
    fn test_defaults() {
        let message = Message::builder(addr("a@example.com")).build();
        assert_eq!(message.charset(), "UTF-8");
        assert_eq!(message.encoding(), TransferEncoding::EightBit);
        assert_eq!(message.content_type(), ContentType::Plain);
        assert!(message.to().is_none());
        assert!(message.attachments().is_none());
        assert!(message.priority().is_none());
    }

    #[test]
    fn test_reply_to_and_return_path_fall_back_to_sender() {
        let message = Message::builder(addr("a@example.com")).build();
        assert_eq!(message.reply_to().email(), "a@example.com");
        assert_eq!(message.return_path(), "a@example.com");

        let message = Message::builder(addr("a@example.com"))
            .reply_to(addr("r@example.com"))
            .return_path("bounce@example.com")
            .build();
        assert_eq!(message.reply_to().email(), "r@example.com");
        assert_eq!(message.return_path(), "bounce@example.com");
    }

    #[test]
    fn test_recipients_order() {
        let message = Message::builder(addr("a@example.com"))
            .bcc(addr("b@example.com"))
            .to(addr("t@example.com"))
            .cc(addr("c@example.com"))
            .build();
        let emails: Vec<_> = message.recipients().iter().map(|a| a.email()).collect();
        assert_eq!(emails, vec!["t@example.com", "c@example.com", "b@example.com"]);
    }

    #[test]
    fn test_line_breaks_dropped_from_header_inputs() {
        let message = Message::builder(addr("a@example.com"))
            .return_path("b@example.com>\r\nX-Injected: yes")
            .header("X-Campaign\r\nBcc", "spring\r\nBcc: leak@evil.test")
            .header("\r\n", "dropped")
            .charset("UTF-8\r\nX-Charset: yes")
            .build();

        assert_eq!(message.return_path(), "b@example.com>X-Injected: yes");
        let headers: Vec<_> = message.custom_headers().collect();
        assert_eq!(
            headers,
            vec![("X-CampaignBcc", "springBcc: leak@evil.test")]
        );
        assert_eq!(message.charset(), "UTF-8X-Charset: yes");
    }

    #[test]
    fn test_priority_clamped() {
        let message = Message::builder(addr("a@example.com")).priority(9).build();
        assert_eq!(message.priority(), Some(5));
    }

    #[test]
    fn test_html_body_sets_content_type() {
        let message = Message::builder(addr("a@example.com"))
            .html_body("<p>x</p>")
            .build();
        assert_eq!(message.content_type(), ContentType::Html);
    }
}
