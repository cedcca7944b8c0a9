//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable (RFC 2045 §6.7) and RFC 2047 header
//! encoding. Encoders are pure string transforms; the decoders exist so that
//! composed output can be inspected and verified.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length, including a trailing soft-break `=`.
const MAX_LINE_LENGTH: usize = 76;

/// Q-encoded lines are folded once the encoded text would pass this column.
const Q_LINE_LIMIT: usize = 74;

/// Line terminator used when folding Q-encoded header values.
const HEADER_FOLD: &str = "\r\n";

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into lines of at most 76 characters.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8], line_ending: &str) -> String {
    let encoded = encode_base64(data);
    let lines: Vec<&str> = encoded
        .as_bytes()
        .chunks(MAX_LINE_LENGTH)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    lines.join(line_ending)
}

/// Decodes Base64 data, ignoring embedded line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Returns true for bytes that RFC 2049 lists as safe to send literally.
const fn is_qp_safe(byte: u8) -> bool {
    matches!(
        byte,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'?'
    )
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Everything outside the RFC 2049 safe set is escaped as `=XX`, including
/// `=` itself. Spaces and tabs stay literal except at the end of a line.
/// Hard line breaks are emitted as `line_ending`; long lines get a soft break
/// (`=` + `line_ending`) before the 76th column. Literal `{unwrap}` markers
/// are dropped before encoding.
#[must_use]
pub fn encode_quoted_printable(text: &str, line_ending: &str) -> String {
    let text = text.replace("{unwrap}", "").replace("{/unwrap}", "");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut output = String::with_capacity(text.len() + text.len() / 8);
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            output.push_str(line_ending);
        }

        let bytes = line.as_bytes();
        let mut current = String::new();
        for (position, &byte) in bytes.iter().enumerate() {
            let at_end = position + 1 == bytes.len();
            let literal = match byte {
                b' ' | b'\t' => !at_end,
                b'=' => false,
                _ => is_qp_safe(byte),
            };
            let width = if literal { 1 } else { 3 };

            if current.len() + width >= MAX_LINE_LENGTH {
                output.push_str(&current);
                output.push('=');
                output.push_str(line_ending);
                current.clear();
            }

            if literal {
                current.push(char::from(byte));
            } else {
                let _ = write!(current, "={byte:02X}");
            }
        }
        output.push_str(&current);
    }

    output
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences or the
/// decoded bytes are not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    String::from_utf8(decode_quoted_printable_bytes(text)?).map_err(Into::into)
}

fn decode_quoted_printable_bytes(text: &str) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(text.len());
    let mut bytes = text.bytes().peekable();

    while let Some(byte) = bytes.next() {
        if byte != b'=' {
            result.push(byte);
            continue;
        }

        // Soft line break
        if bytes.peek() == Some(&b'\r') {
            bytes.next();
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            continue;
        }
        if bytes.peek() == Some(&b'\n') {
            bytes.next();
            continue;
        }

        let hex: Vec<u8> = bytes.by_ref().take(2).collect();
        let decoded = std::str::from_utf8(&hex)
            .ok()
            .filter(|h| h.len() == 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| {
                Error::InvalidEncoding(format!(
                    "Invalid escape sequence: ={}",
                    String::from_utf8_lossy(&hex)
                ))
            })?;
        result.push(decoded);
    }

    Ok(result)
}

/// Encodes a header value as RFC 2047 Q encoded-words.
///
/// Every character becomes the `=XX` form of its UTF-8 bytes. CR and LF are
/// removed first. When a line would pass column 74 the encoded-word is closed
/// and a folded continuation (`CRLF` + space) starts a new one; a character's
/// bytes are never split across encoded-words.
#[must_use]
pub fn encode_q(text: &str, charset: &str) -> String {
    let prefix = format!("=?{charset}?Q?");
    let mut output = prefix.clone();
    let mut length = prefix.len();

    for ch in text.chars().filter(|c| !matches!(c, '\r' | '\n')) {
        let mut buf = [0u8; 4];
        let mut encoded = String::with_capacity(12);
        for byte in ch.encode_utf8(&mut buf).bytes() {
            let _ = write!(encoded, "={byte:02X}");
        }

        if length + encoded.len() > Q_LINE_LIMIT {
            output.push_str("?=");
            output.push_str(HEADER_FOLD);
            output.push(' ');
            output.push_str(&prefix);
            length = 1 + prefix.len();
        }
        output.push_str(&encoded);
        length += encoded.len();
    }

    output.push_str("?=");
    output
}

/// Decodes a header value made of RFC 2047 encoded-words.
///
/// Whitespace between adjacent encoded-words is dropped; plain words are kept
/// as they are.
///
/// # Errors
///
/// Returns an error if an encoded-word is malformed.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut output = Vec::new();
    let mut previous_encoded = false;

    for (index, word) in text.split_whitespace().enumerate() {
        match decode_encoded_word(word)? {
            Some(bytes) => {
                if index > 0 && !previous_encoded {
                    output.push(b' ');
                }
                output.extend_from_slice(&bytes);
                previous_encoded = true;
            }
            None => {
                if index > 0 {
                    output.push(b' ');
                }
                output.extend_from_slice(word.as_bytes());
                previous_encoded = false;
            }
        }
    }

    String::from_utf8(output).map_err(Into::into)
}

/// Decodes one `=?charset?encoding?text?=` word; `None` if `word` is not one.
fn decode_encoded_word(word: &str) -> Result<Option<Vec<u8>>> {
    let Some(inner) = word
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
    else {
        return Ok(None);
    };

    let parts: Vec<&str> = inner.splitn(3, '?').collect();
    let [_charset, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(format!(
            "Invalid RFC 2047 word: {word}"
        )));
    };

    match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text).map(Some),
        "Q" => decode_quoted_printable_bytes(&encoded_text.replace('_', " ")).map(Some),
        other => Err(Error::InvalidEncoding(format!("Unknown encoding: {other}"))),
    }
}
