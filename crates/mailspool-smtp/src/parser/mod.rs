//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from its response lines.
///
/// Replies are single-line (`250 OK`) or multi-line, where every line but
/// the last uses `-` after the code (`250-First`, `250 Last`). The code is
/// taken from the first line.
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::InvalidReply("Empty reply".into()));
    };

    let code_str = first
        .get(0..3)
        .ok_or_else(|| Error::InvalidReply(format!("Reply too short: {first}")))?;
    let code = ReplyCode::parse(code_str)
        .ok_or_else(|| Error::InvalidReply(format!("Invalid reply code: {code_str}")))?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        match line.len() {
            3 => message.push(String::new()),
            len if len > 3 && line.is_char_boundary(4) => message.push(line[4..].to_string()),
            _ => return Err(Error::InvalidReply(format!("Malformed reply line: {line}"))),
        }
    }

    Ok(Reply::new(code, message))
}

/// Checks if a line is the last line of a reply.
///
/// A bare code (`250`) or a code followed by a space ends the reply.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}
