//! Ordered header map.

/// Removes CR and LF so that `value` cannot start a header line of its own.
pub(crate) fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

/// Keeps the characters allowed in a header field name (printable ASCII
/// other than `:`).
pub(crate) fn field_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && *c != ':')
        .collect()
}

/// Collection of message headers in wire order.
///
/// Names compare case-insensitively but keep the spelling they were first
/// inserted with. Replacing a value keeps the header at its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header value, replacing any existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Gets the value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.entries.remove(index).1)
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every header as `Name: value` followed by `line_ending`.
    #[must_use]
    pub fn render(&self, line_ending: &str) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&value.replace("\r\n", line_ending));
            out.push_str(line_ending);
        }
        out
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
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

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_set_get() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut headers = Headers::new();
        headers.set("To", "alice@example.com");
        headers.set("Subject", "Hi");
        headers.set("to", "bob@example.com");

        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["To", "Subject"]);
        assert_eq!(headers.get("To"), Some("bob@example.com"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.set("Subject", "Test");
        assert_eq!(headers.remove("subject").as_deref(), Some("Test"));
        assert!(!headers.contains("Subject"));
    }

    #[test]
    fn test_render_preserves_order() {
        let headers: Headers = [("X-Mailer", "mailspool"), ("From", "a@example.com")]
            .into_iter()
            .collect();
        assert_eq!(
            headers.render("\r\n"),
            "X-Mailer: mailspool\r\nFrom: a@example.com\r\n"
        );
    }

    #[test]
    fn test_strip_line_breaks() {
        assert_eq!(strip_line_breaks("a\r\nBcc: x\ny\r"), "aBcc: xy");
        assert_eq!(field_name("X-Bad:\r\nBcc"), "X-BadBcc");
        assert_eq!(field_name("X Campaign"), "XCampaign");
    }

    #[test]
    fn test_render_rewrites_folded_values() {
        let mut headers = Headers::new();
        headers.set("Subject", "=?UTF-8?Q?=41?=\r\n =?UTF-8?Q?=42?=");
        assert_eq!(
            headers.render("\n"),
            "Subject: =?UTF-8?Q?=41?=\n =?UTF-8?Q?=42?=\n"
        );
    }
}
