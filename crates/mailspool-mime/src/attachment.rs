//! File attachments.

use crate::encoding::encode_base64_wrapped;
use crate::error::Result;
use crate::header::strip_line_breaks;
use std::path::Path;

/// A file attached to a message.
///
/// Content is read once at construction and only exposed as a rendered
/// base64 MIME body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    filename: String,
    mime_type: String,
    content_id: String,
    data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from in-memory bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content_id: format!("{}@mailspool", uuid::Uuid::new_v4().simple()),
            data,
        }
    }

    /// Reads a file, guessing its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |name| name.to_string_lossy().into_owned());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(filename, mime_type, data))
    }

    /// Overrides the display filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Overrides the generated `Content-ID`.
    #[must_use]
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = content_id.into();
        self
    }

    /// Display filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// MIME type, e.g. `application/pdf`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Content identifier, without angle brackets.
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Renders the attachment as a MIME body part (headers, blank line, payload).
    ///
    /// Quotes and line breaks are dropped from the filename, MIME type and
    /// content id so that none of them can end its header line early.
    #[must_use]
    pub fn render(&self, line_ending: &str) -> String {
        let filename = strip_line_breaks(&self.filename).replace('"', "");
        let mime_type = strip_line_breaks(&self.mime_type);
        let content_id = strip_line_breaks(&self.content_id).replace(['<', '>'], "");
        let mut part = String::new();
        for header in [
            format!("Content-Type: {mime_type}; name=\"{filename}\""),
            format!("Content-Disposition: attachment; filename=\"{filename}\""),
            "Content-Transfer-Encoding: base64".to_string(),
            format!("Content-ID: <{content_id}>"),
        ] {
            part.push_str(&header);
            part.push_str(line_ending);
        }
        part.push_str(line_ending);
        part.push_str(&encode_base64_wrapped(&self.data, line_ending));
        part
    }
}
