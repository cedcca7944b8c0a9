//! # mailspool-mime
//!
//! Composition of outgoing mail: header maps, multipart bodies and the
//! encodings they need.
//!
//! ## Features
//!
//! - **Message model**: Recipients, bodies, priority, attachments, subscribers
//! - **Headers**: Ordered header map with in-place replacement
//! - **Bodies**: Plain text, HTML, or `multipart/alternative` with a text part
//! - **Encoding/Decoding**: Base64, Quoted-Printable, RFC 2047 Q-encoding
//! - **Wrapping**: Word wrap that leaves URLs and `{unwrap}` spans intact
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailspool_mime::{Address, ComposeOptions, Message, compose};
//!
//! let message = Message::builder(Address::new("sender@example.com")?)
//!     .to(Address::new("recipient@example.com")?)
//!     .subject("Newsletter")
//!     .html_body("<h1>Hello</h1><p>World</p>")
//!     .build();
//!
//! let composition = compose(&message, &ComposeOptions::default());
//! print!("{}", composition.headers.render("\r\n"));
//! print!("\r\n{}", composition.body);
//! ```
//!
//! ### Encoding/Decoding
//!
//! ```ignore
//! use mailspool_mime::encoding::{encode_q, encode_quoted_printable};
//!
//! let subject = encode_q("Grüße", "UTF-8");
//! let body = encode_quoted_printable("Héllo, Wørld!", "\r\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod attachment;
mod error;
mod header;
mod message;

pub mod compose;
pub mod encoding;
pub mod wrap;

pub use address::{Address, is_valid_mailbox};
pub use attachment::Attachment;
pub use compose::{Boundary, ComposeOptions, Composition, LineEnding, compose};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{ContentType, Message, MessageBuilder, TransferEncoding};
