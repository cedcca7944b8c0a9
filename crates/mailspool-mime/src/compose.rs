//! Turns a [`Message`] into wire-ready headers and body.
//!
//! Composition is pure: the only inputs are the message, the per-send
//! [`Boundary`] and the [`ComposeOptions`] chosen by the transport.

use crate::address::is_valid_mailbox;
use crate::encoding::{encode_q, encode_quoted_printable};
use crate::header::{Headers, strip_line_breaks};
use crate::message::{ContentType, Message};
use crate::wrap::{DEFAULT_WRAP_LIMIT, strip_tags, to_line_ending, unwrap_spans, wordwrap};
use std::fmt;

/// Preamble shown by mail readers that do not understand MIME.
const PREAMBLE: [&str; 2] = [
    "This is a multi-part message in MIME format.",
    "Your email application may not support this format.",
];

/// Line terminator used in the composed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n`
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl LineEnding {
    /// Returns the terminator as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crlf => "\r\n",
            Self::Lf => "\n",
        }
    }
}

/// Transport-dependent composition settings.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Value of the `User-Agent` and `X-Mailer` headers.
    pub user_agent: String,
    /// Emit a `Bcc` header (only safe for direct SMTP delivery).
    pub include_bcc: bool,
    /// Emit a `Subject` header; off when the transport passes it separately.
    pub include_subject: bool,
    /// Send HTML as `multipart/alternative` with a plain-text part.
    pub multipart: bool,
    /// Column limit for plain-text bodies; `None` leaves them untouched.
    /// HTML is always wrapped, at 76 columns when unset.
    pub wordwrap: Option<usize>,
    /// Line terminator of the composed output.
    pub line_ending: LineEnding,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            user_agent: "mailspool".to_string(),
            include_bcc: false,
            include_subject: true,
            multipart: true,
            wordwrap: None,
            line_ending: LineEnding::Crlf,
        }
    }
}

/// Multipart boundary tokens, generated once per send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    token: String,
}

impl Boundary {
    /// Generates a new token from the current time and a random suffix.
    #[must_use]
    pub fn generate() -> Self {
        let timestamp = chrono::Utc::now().timestamp_micros();
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self {
            token: format!("{timestamp:x}{}", &random[..12]),
        }
    }

    /// Uses a fixed token.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Boundary of the `multipart/alternative` body.
    #[must_use]
    pub fn alternative(&self) -> String {
        format!("__mailspool_alt_{}", self.token)
    }

    /// Boundary of the outer `multipart/mixed` body used for attachments.
    #[must_use]
    pub fn mixed(&self) -> String {
        format!("__mailspool_mix_{}", self.token)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Output of [`compose`]: everything a transport needs besides the envelope.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Headers in wire order.
    pub headers: Headers,
    /// Wire-ready body.
    pub body: String,
    /// Q-encoded subject, for transports that pass it out of band.
    pub subject: String,
}

/// Composes headers and body with a freshly generated boundary.
#[must_use]
pub fn compose(message: &Message, options: &ComposeOptions) -> Composition {
    let boundary = Boundary::generate();
    Composition {
        headers: compose_headers(message, options, &boundary),
        body: compose_body(message, options, &boundary),
        subject: encode_q(message.subject(), message.charset()),
    }
}

fn has_attachments(message: &Message) -> bool {
    message.attachments().is_some_and(|list| !list.is_empty())
}

fn join_emails(list: &[crate::Address]) -> String {
    list.iter()
        .map(crate::Address::email)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the header map.
///
/// Custom headers come first; generated headers of the same name replace
/// them in place.
#[must_use]
pub fn compose_headers(message: &Message, options: &ComposeOptions, boundary: &Boundary) -> Headers {
    let mut headers: Headers = message.custom_headers().collect();

    let user_agent = strip_line_breaks(&options.user_agent);
    headers.set("User-Agent", user_agent.as_str());
    headers.set("X-Mailer", user_agent);
    headers.set("X-Sender", message.from().email());
    if let Some(priority) = message.priority() {
        headers.set("X-Priority", priority.to_string());
    }
    headers.set(
        "Message-ID",
        format!("<{}.{}>", uuid::Uuid::new_v4().simple(), message_id_domain(message)),
    );
    headers.set("Date", chrono::Local::now().to_rfc2822());
    headers.set("Mime-Version", Message::MIME_VERSION);

    if let Some(to) = message.to() {
        headers.set("To", join_emails(to));
    }
    headers.set("From", message.from().to_string());
    if let Some(cc) = message.cc() {
        headers.set("Cc", join_emails(cc));
    }
    if options.include_bcc
        && let Some(bcc) = message.bcc()
    {
        headers.set("Bcc", join_emails(bcc));
    }
    headers.set("Reply-To", message.reply_to().to_string());
    if options.include_subject {
        headers.set("Subject", encode_q(message.subject(), message.charset()));
    }

    if has_attachments(message) {
        headers.set(
            "Content-Type",
            format!("multipart/mixed; boundary=\"{}\"", boundary.mixed()),
        );
        return headers;
    }

    for (name, value) in content_headers(message, options, boundary) {
        headers.set(name, value);
    }
    headers
}

/// The return path when it is a valid mailbox, the sender otherwise.
fn message_id_domain(message: &Message) -> &str {
    let return_path = message.return_path();
    if is_valid_mailbox(return_path) {
        return_path
    } else {
        message.from().email()
    }
}

/// `Content-Type` / `Content-Transfer-Encoding` for the message content.
fn content_headers(
    message: &Message,
    options: &ComposeOptions,
    boundary: &Boundary,
) -> Vec<(&'static str, String)> {
    let charset = message.charset();
    match message.content_type() {
        ContentType::Plain => vec![
            ("Content-Type", format!("text/plain; charset={charset}")),
            ("Content-Transfer-Encoding", message.encoding().to_string()),
        ],
        ContentType::Html if !options.multipart => vec![
            ("Content-Type", format!("text/html; charset={charset}")),
            ("Content-Transfer-Encoding", "quoted-printable".to_string()),
        ],
        ContentType::Html => vec![(
            "Content-Type",
            format!(
                "multipart/alternative; boundary=\"{}\"",
                boundary.alternative()
            ),
        )],
    }
}

/// Builds the body.
///
/// Protected `{unwrap}` spans are replaced by their content and every line
/// break is converted to the configured terminator.
#[must_use]
pub fn compose_body(message: &Message, options: &ComposeOptions, boundary: &Boundary) -> String {
    let eol = options.line_ending.as_str();

    let content = content_body(message, options, boundary);
    let body = match message.attachments() {
        Some(attachments) if !attachments.is_empty() => {
            let mixed = boundary.mixed();
            let mut body = preamble(eol);
            body.push_str(&format!("--{mixed}{eol}"));
            for (name, value) in content_headers(message, options, boundary) {
                body.push_str(&format!("{name}: {value}{eol}"));
            }
            body.push_str(eol);
            body.push_str(&content);
            for attachment in attachments {
                body.push_str(&format!("{eol}{eol}--{mixed}{eol}"));
                body.push_str(&attachment.render(eol));
            }
            body.push_str(&format!("{eol}{eol}--{mixed}--"));
            body
        }
        _ => content,
    };

    to_line_ending(&unwrap_spans(&body), eol)
}

fn preamble(eol: &str) -> String {
    format!("{}{eol}{}{eol}{eol}", PREAMBLE[0], PREAMBLE[1])
}

fn content_body(message: &Message, options: &ComposeOptions, boundary: &Boundary) -> String {
    let eol = options.line_ending.as_str();
    let html_limit = options.wordwrap.unwrap_or(DEFAULT_WRAP_LIMIT);

    match message.content_type() {
        ContentType::Plain => match options.wordwrap {
            Some(limit) => wordwrap(message.body(), limit, eol),
            None => message.body().to_string(),
        },
        ContentType::Html if !options.multipart => {
            encode_quoted_printable(&wordwrap(message.body(), html_limit, eol), eol)
        }
        ContentType::Html => {
            let alt = boundary.alternative();
            let charset = message.charset();
            let alt_body = if message.alt_body().is_empty() {
                strip_tags(message.body())
            } else {
                message.alt_body().to_string()
            };
            let html = encode_quoted_printable(&wordwrap(message.body(), html_limit, eol), eol);

            let mut body = preamble(eol);
            body.push_str(&format!("--{alt}{eol}"));
            body.push_str(&format!("Content-Type: text/plain; charset={charset}{eol}"));
            body.push_str(&format!(
                "Content-Transfer-Encoding: {}{eol}{eol}",
                message.encoding()
            ));
            body.push_str(&alt_body);
            body.push_str(&format!("{eol}{eol}--{alt}{eol}"));
            body.push_str(&format!("Content-Type: text/html; charset={charset}{eol}"));
            body.push_str(&format!("Content-Transfer-Encoding: quoted-printable{eol}{eol}"));
            body.push_str(&html);
            body.push_str(&format!("{eol}{eol}--{alt}--"));
            body
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::encoding::{decode_quoted_printable, decode_rfc2047};
    use crate::{Address, Attachment, TransferEncoding};

    fn addr(email: &str) -> Address {
        Address::new(email).unwrap()
    }

    fn boundary() -> Boundary {
        Boundary::from_token("test")
    }

    fn html_message(alt: &str) -> Message {
        Message::builder(Address::with_name("sender@example.com", "Sender").unwrap())
            .to(addr("rcpt@example.com"))
            .subject("Hello")
            .html_body("<h1>Title</h1><p>Some <b>bold</b> text</p>")
            .alt_body(alt)
            .build()
    }

    /// Splits a multipart body into the parts between `--boundary` lines.
    fn parts<'a>(body: &'a str, boundary: &str, eol: &str) -> Vec<&'a str> {
        let delimiter = format!("{eol}--{boundary}");
        body.split(&delimiter)
            .skip(1)
            .filter(|part| !part.starts_with("--"))
            .collect()
    }

    #[test]
    fn header_order_and_values() {
        let message = Message::builder(addr("sender@example.com"))
            .to(addr("a@example.com"))
            .to(addr("b@example.com"))
            .cc(addr("c@example.com"))
            .bcc(addr("d@example.com"))
            .priority(1)
            .subject("Hi")
            .text_body("body")
            .build();
        let options = ComposeOptions {
            user_agent: "agent/1.0".to_string(),
            ..ComposeOptions::default()
        };
        let headers = compose_headers(&message, &options, &boundary());

        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "User-Agent",
                "X-Mailer",
                "X-Sender",
                "X-Priority",
                "Message-ID",
                "Date",
                "Mime-Version",
                "To",
                "From",
                "Cc",
                "Reply-To",
                "Subject",
                "Content-Type",
                "Content-Transfer-Encoding",
            ]
        );
        assert_eq!(headers.get("User-Agent"), Some("agent/1.0"));
        assert_eq!(headers.get("X-Mailer"), Some("agent/1.0"));
        assert_eq!(headers.get("X-Sender"), Some("sender@example.com"));
        assert_eq!(headers.get("X-Priority"), Some("1"));
        assert_eq!(headers.get("To"), Some("a@example.com, b@example.com"));
        assert_eq!(headers.get("Cc"), Some("c@example.com"));
        assert_eq!(headers.get("Reply-To"), Some("sender@example.com"));
        assert_eq!(headers.get("Mime-Version"), Some("1.0"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=UTF-8")
        );
        assert_eq!(headers.get("Content-Transfer-Encoding"), Some("8bit"));
    }

    #[test]
    fn message_id_carries_return_path() {
        let message = Message::builder(addr("sender@example.com"))
            .return_path("bounce@example.com")
            .build();
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        let id = headers.get("Message-ID").unwrap();
        assert!(id.starts_with('<'));
        assert!(id.ends_with(".bounce@example.com>"));

        let other = compose_headers(&message, &ComposeOptions::default(), &boundary());
        assert_ne!(other.get("Message-ID"), Some(id));
    }

    #[test]
    fn message_id_ignores_malformed_return_path() {
        let message = Message::builder(addr("sender@example.com"))
            .return_path("b@example.com>\r\nX-Injected: yes")
            .build();
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        assert!(headers.get("Message-ID").unwrap().ends_with(".sender@example.com>"));
    }

    #[test]
    fn caller_input_cannot_add_header_lines() {
        let message = Message::builder(addr("sender@example.com"))
            .to(addr("rcpt@example.com"))
            .bcc(addr("hidden@example.com"))
            .return_path("b@example.com>\r\nX-Injected: yes")
            .header("X-Campaign", "spring\r\nBcc: leak@evil.test")
            .text_body("Body")
            .attach(Attachment::new("f.txt\r\nX-Att: yes", "text/plain", b"hi".to_vec()))
            .build();
        let options = ComposeOptions {
            user_agent: "agent\r\nX-Agent: yes".into(),
            ..ComposeOptions::default()
        };
        let composed = compose(&message, &options);
        let wire = format!(
            "{}\r\n{}",
            composed.headers.render("\r\n"),
            composed.body
        );

        for line in wire.split("\r\n") {
            for injected in ["Bcc:", "X-Injected:", "X-Att:", "X-Agent:"] {
                assert!(!line.starts_with(injected), "injected line {line:?}");
            }
        }
        assert_eq!(composed.headers.get("X-Mailer"), Some("agentX-Agent: yes"));
    }

    #[test]
    fn bcc_only_when_requested() {
        let message = Message::builder(addr("sender@example.com"))
            .bcc(addr("hidden@example.com"))
            .build();
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        assert!(!headers.contains("Bcc"));

        let options = ComposeOptions {
            include_bcc: true,
            ..ComposeOptions::default()
        };
        let headers = compose_headers(&message, &options, &boundary());
        assert_eq!(headers.get("Bcc"), Some("hidden@example.com"));
    }

    #[test]
    fn subject_q_encoded_and_optional() {
        let message = Message::builder(addr("sender@example.com"))
            .subject("Grüße")
            .build();
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        let subject = headers.get("Subject").unwrap();
        assert!(subject.starts_with("=?UTF-8?Q?"));
        assert_eq!(decode_rfc2047(subject).unwrap(), "Grüße");

        let options = ComposeOptions {
            include_subject: false,
            ..ComposeOptions::default()
        };
        let headers = compose_headers(&message, &options, &boundary());
        assert!(!headers.contains("Subject"));
    }

    #[test]
    fn custom_headers_first_and_overridable() {
        let message = Message::builder(addr("sender@example.com"))
            .header("X-Campaign", "spring")
            .header("X-Mailer", "ignored")
            .build();
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        let names: Vec<_> = headers.iter().map(|(name, _)| name).take(2).collect();
        assert_eq!(names, vec!["X-Campaign", "X-Mailer"]);
        assert_eq!(headers.get("X-Mailer"), Some("mailspool"));
    }

    #[test]
    fn named_from_and_reply_to() {
        let message = html_message("");
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        assert_eq!(headers.get("From"), Some("\"Sender\" <sender@example.com>"));
        assert_eq!(
            headers.get("Reply-To"),
            Some("\"Sender\" <sender@example.com>")
        );
    }

    #[test]
    fn html_content_type_headers() {
        let message = html_message("");
        let headers = compose_headers(&message, &ComposeOptions::default(), &boundary());
        assert_eq!(
            headers.get("Content-Type"),
            Some("multipart/alternative; boundary=\"__mailspool_alt_test\"")
        );
        assert!(!headers.contains("Content-Transfer-Encoding"));

        let options = ComposeOptions {
            multipart: false,
            ..ComposeOptions::default()
        };
        let headers = compose_headers(&message, &options, &boundary());
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/html; charset=UTF-8")
        );
        assert_eq!(
            headers.get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
    }

    #[test]
    fn alternative_body_structure() {
        let message = html_message("");
        let options = ComposeOptions::default();
        let body = compose_body(&message, &options, &boundary());

        assert!(body.starts_with("This is a multi-part message in MIME format.\r\n"));
        assert!(body.ends_with("\r\n--__mailspool_alt_test--"));

        let parts = parts(&body, "__mailspool_alt_test", "\r\n");
        assert_eq!(parts.len(), 2);

        let (plain_headers, plain) = parts[0].split_once("\r\n\r\n").unwrap();
        assert!(plain_headers.contains("Content-Type: text/plain; charset=UTF-8"));
        assert!(plain_headers.contains("Content-Transfer-Encoding: 8bit"));
        assert_eq!(plain.trim_end(), "TitleSome bold text");

        let (html_headers, html) = parts[1].split_once("\r\n\r\n").unwrap();
        assert!(html_headers.contains("Content-Type: text/html; charset=UTF-8"));
        assert!(html_headers.contains("Content-Transfer-Encoding: quoted-printable"));
        assert_eq!(
            decode_quoted_printable(html.trim_end()).unwrap(),
            message.body()
        );
    }

    #[test]
    fn empty_alt_body_is_stripped_html() {
        let message = html_message("");
        let body = compose_body(&message, &ComposeOptions::default(), &boundary());
        let plain = parts(&body, "__mailspool_alt_test", "\r\n")[0];
        let (_, text) = plain.split_once("\r\n\r\n").unwrap();
        assert_eq!(text.trim_end(), strip_tags(message.body()));
    }

    #[test]
    fn explicit_alt_body_used() {
        let message = html_message("Plain version");
        let body = compose_body(&message, &ComposeOptions::default(), &boundary());
        assert!(body.contains("\r\n\r\nPlain version\r\n\r\n--__mailspool_alt_test\r\n"));
    }

    #[test]
    fn html_without_multipart_is_quoted_printable() {
        let message = html_message("");
        let options = ComposeOptions {
            multipart: false,
            line_ending: LineEnding::Lf,
            ..ComposeOptions::default()
        };
        let body = compose_body(&message, &options, &boundary());
        assert!(!body.contains("__mailspool_alt_test"));
        assert_eq!(decode_quoted_printable(&body).unwrap(), message.body());
    }

    #[test]
    fn plain_body_untouched_without_wordwrap() {
        let long = "word ".repeat(40);
        let message = Message::builder(addr("sender@example.com"))
            .text_body(long.trim_end())
            .build();
        let body = compose_body(&message, &ComposeOptions::default(), &boundary());
        assert_eq!(body, long.trim_end());
    }

    #[test]
    fn plain_body_wrapped_when_enabled() {
        let long = "word ".repeat(40);
        let message = Message::builder(addr("sender@example.com"))
            .text_body(long.trim_end())
            .build();
        let options = ComposeOptions {
            wordwrap: Some(20),
            ..ComposeOptions::default()
        };
        let body = compose_body(&message, &options, &boundary());
        assert!(body.split("\r\n").all(|line| line.len() <= 20));
    }

    #[test]
    fn unwrap_markers_removed_from_final_body() {
        let message = Message::builder(addr("sender@example.com"))
            .text_body("Hi {unwrap}<img src=\"https://t.example/p.gif\">{/unwrap} there")
            .build();
        let body = compose_body(&message, &ComposeOptions::default(), &boundary());
        assert_eq!(body, "Hi <img src=\"https://t.example/p.gif\"> there");
    }

    #[test]
    fn body_line_endings_follow_options() {
        let message = Message::builder(addr("sender@example.com"))
            .text_body("a\nb\r\nc")
            .build();
        let body = compose_body(&message, &ComposeOptions::default(), &boundary());
        assert_eq!(body, "a\r\nb\r\nc");

        let options = ComposeOptions {
            line_ending: LineEnding::Lf,
            ..ComposeOptions::default()
        };
        assert_eq!(compose_body(&message, &options, &boundary()), "a\nb\nc");
    }

    #[test]
    fn attachments_use_mixed_envelope() {
        let message = Message::builder(addr("sender@example.com"))
            .text_body("see attached")
            .encoding(TransferEncoding::SevenBit)
            .attach(Attachment::new("a.txt", "text/plain", b"one".to_vec()).with_content_id("c1"))
            .attach(Attachment::new("b.bin", "application/octet-stream", vec![0, 1]))
            .build();
        let options = ComposeOptions::default();

        let headers = compose_headers(&message, &options, &boundary());
        assert_eq!(
            headers.get("Content-Type"),
            Some("multipart/mixed; boundary=\"__mailspool_mix_test\"")
        );
        assert!(!headers.contains("Content-Transfer-Encoding"));

        let body = compose_body(&message, &options, &boundary());
        assert!(body.ends_with("\r\n--__mailspool_mix_test--"));
        let parts = parts(&body, "__mailspool_mix_test", "\r\n");
        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains("Content-Type: text/plain; charset=UTF-8\r\n"));
        assert!(parts[0].contains("Content-Transfer-Encoding: 7bit\r\n\r\nsee attached"));
        assert!(parts[1].contains("Content-Type: text/plain; name=\"a.txt\""));
        assert!(parts[1].contains("Content-ID: <c1>"));
        assert!(parts[2].contains("Content-Transfer-Encoding: base64"));
    }

    #[test]
    fn html_with_attachment_nests_alternative() {
        let message = Message::builder(addr("sender@example.com"))
            .html_body("<p>hi</p>")
            .attach(Attachment::new("a.txt", "text/plain", b"x".to_vec()))
            .build();
        let body = compose_body(&message, &ComposeOptions::default(), &boundary());
        let outer = parts(&body, "__mailspool_mix_test", "\r\n");
        assert_eq!(outer.len(), 2);
        assert!(outer[0].contains(
            "Content-Type: multipart/alternative; boundary=\"__mailspool_alt_test\"\r\n\r\n"
        ));
        assert!(outer[0].contains("--__mailspool_alt_test--"));
    }

    #[test]
    fn generated_boundaries_are_unique() {
        let a = Boundary::generate();
        let b = Boundary::generate();
        assert_ne!(a, b);
        assert_ne!(a.alternative(), a.mixed());
        assert!(!a.mixed().starts_with(&a.alternative()));
    }

    #[test]
    fn compose_returns_encoded_subject() {
        let message = Message::builder(addr("sender@example.com"))
            .subject("Hi")
            .build();
        let composition = compose(&message, &ComposeOptions::default());
        assert_eq!(composition.subject, "=?UTF-8?Q?=48=69?=");
    }
}
