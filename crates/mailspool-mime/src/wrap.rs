//! Line wrapping for plain-text and quoted-printable bodies.
//!
//! Text between `{unwrap}` and `{/unwrap}` is never wrapped; the markers stay
//! in place so that wrapping is stable when applied twice, and are removed by
//! [`unwrap_spans`] once the body is final.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Default column limit (RFC 2045).
pub const DEFAULT_WRAP_LIMIT: usize = 76;

#[allow(clippy::expect_used)]
static PROTECTED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{unwrap\}.+?\{/unwrap\}").expect("protected span pattern is valid")
});

#[allow(clippy::expect_used)]
static UNWRAP_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)\{unwrap\}(.*?)\{/unwrap\}").expect("unwrap marker pattern is valid")
});

#[allow(clippy::expect_used)]
static URL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[url.+\]|://|www\.").expect("url pattern is valid"));

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{unwrapped\d+\}\}").expect("placeholder pattern is valid"));

#[allow(clippy::expect_used)]
static TRAILING_BLANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("trailing blank pattern is valid"));

/// Wraps `text` so that lines stay within `limit` characters.
///
/// Lines break only at spaces. A single word longer than `limit` is cut into
/// `limit`-sized pieces unless it looks like a URL (`scheme://`, `www.` or a
/// `[url ...]` marker). Protected spans are restored verbatim, markers
/// included. Lines are joined with `line_ending`.
#[must_use]
pub fn wordwrap(text: &str, limit: usize, line_ending: &str) -> String {
    let limit = limit.max(1);
    let text = normalize_newlines(text);
    let text = TRAILING_BLANKS.replace_all(&text, "\n");

    let mut protected: Vec<String> = Vec::new();
    let text = PROTECTED_SPAN.replace_all(&text, |caps: &Captures<'_>| {
        let placeholder = format!("{{{{unwrapped{}}}}}", protected.len());
        protected.push(caps[0].to_string());
        placeholder
    });

    let mut filled = Vec::new();
    for line in text.split('\n') {
        fill_line(line, limit, &mut filled);
    }

    let mut lines = Vec::with_capacity(filled.len());
    for line in filled {
        if unprotected_width(&line) <= limit || URL_LIKE.is_match(&line) {
            lines.push(line);
            continue;
        }
        split_line(&line, limit, &mut lines);
    }

    let mut output = lines.join(line_ending);
    for (index, original) in protected.iter().enumerate() {
        output = output.replace(&format!("{{{{unwrapped{index}}}}}"), original);
    }
    output
}

/// Greedy fill of a single source line, breaking only at spaces.
fn fill_line(line: &str, limit: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut width = 0;

    for (index, word) in line.split(' ').enumerate() {
        let word_width = word.chars().count();
        if index == 0 {
            current.push_str(word);
            width = word_width;
        } else if width + 1 + word_width <= limit {
            current.push(' ');
            current.push_str(word);
            width += 1 + word_width;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
            width = word_width;
        }
    }

    out.push(current);
}

/// Characters of `line` outside protected-span placeholders.
fn unprotected_width(line: &str) -> usize {
    let placeholders: usize = PLACEHOLDER
        .find_iter(line)
        .map(|m| m.as_str().chars().count())
        .sum();
    line.chars().count() - placeholders
}

/// Cuts `line` into pieces of at most `limit` unprotected characters.
/// Placeholders are never cut and do not count towards the limit.
fn split_line(line: &str, limit: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut width = 0;
    let mut last = 0;
    for placeholder in PLACEHOLDER.find_iter(line) {
        for ch in line[last..placeholder.start()].chars() {
            push_char(ch, limit, &mut current, &mut width, out);
        }
        current.push_str(placeholder.as_str());
        last = placeholder.end();
    }
    for ch in line[last..].chars() {
        push_char(ch, limit, &mut current, &mut width, out);
    }
    if !current.is_empty() {
        out.push(current);
    }
}

fn push_char(ch: char, limit: usize, current: &mut String, width: &mut usize, out: &mut Vec<String>) {
    if *width == limit {
        out.push(std::mem::take(current));
        *width = 0;
    }
    current.push(ch);
    *width += 1;
}

/// Replaces every `{unwrap}...{/unwrap}` span with its inner content.
#[must_use]
pub fn unwrap_spans(text: &str) -> String {
    UNWRAP_MARKERS.replace_all(text, "$1").into_owned()
}

/// Removes markup tags, keeping the text between them.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => in_tag = true,
            (true, '>') => in_tag = false,
            (false, _) => output.push(ch),
            (true, _) => {}
        }
    }

    output
}

/// Converts CRLF and lone CR to LF.
#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

/// Converts every line break to `line_ending`.
#[must_use]
pub fn to_line_ending(text: &str, line_ending: &str) -> String {
    let text = normalize_newlines(text);
    if line_ending == "\n" {
        text
    } else {
        text.replace('\n', line_ending)
    }
}
