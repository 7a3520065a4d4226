//! `multipart/form-data` wire encoding.
//!
//! A [`Form`] is usually built from the [`FieldRecord`]s produced by
//! [`flatten`](crate::flatten), then rendered with [`Form::into_body`].
//!
//! # Example
//!
//! ```
//! use courier_core::{FileRef, Form, flatten, map};
//!
//! let body = map! { "user" => map! { "avatar" => FileRef::memory("pic.png", vec![1_u8, 2]) } };
//! let form = Form::with_boundary("xyz").fields(&flatten(&body).expect("flatten"));
//!
//! let (content_type, bytes) = form.into_body();
//! assert_eq!(content_type, "multipart/form-data; boundary=xyz");
//! assert!(bytes.starts_with(b"--xyz\r\n"));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::FieldRecord;

/// A single part in a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Create a new part with the given name and data.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Set the filename for this part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type for this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the part data.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// File fields keep their filename and MIME type; scalar fields become
/// untyped parts holding their stringified value.
impl From<&FieldRecord> for Part {
    fn from(field: &FieldRecord) -> Self {
        let mut part = Self::new(field.name(), field.contents().to_bytes());
        part.filename = field.filename().map(str::to_string);
        part.content_type = field.mime_type().map(str::to_string);
        part
    }
}

/// A multipart form containing multiple parts.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create a new empty form with a generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create a new form with a custom boundary.
    ///
    /// The boundary should be a unique string that doesn't appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Add a part to the form.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add flattened fields, in order.
    #[must_use]
    pub fn fields<'a>(mut self, fields: impl IntoIterator<Item = &'a FieldRecord>) -> Self {
        self.parts.extend(fields.into_iter().map(Part::from));
        self
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the parts in this form.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Returns a tuple of (content-type header value, body bytes).
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let content_type = self.content_type();
        let body = self.encode();
        (content_type, body)
    }

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            buf.put_slice(b"Content-Disposition: form-data; name=\"");
            buf.put_slice(escape_quoted(&part.name).as_bytes());
            buf.put_slice(b"\"");
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                buf.put_slice(escape_quoted(filename).as_bytes());
                buf.put_slice(b"\"");
            }
            buf.put_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

/// Quotes and line breaks would end the header parameter early.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    format!("----CourierBoundary{timestamp:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_from_scalar_field() {
        let part = Part::from(&FieldRecord::scalar("user[age]", 31));
        assert_eq!(part.name(), "user[age]");
        assert_eq!(part.data().as_ref(), b"31");
        assert!(part.filename().is_none());
        assert!(part.content_type().is_none());
    }

    #[test]
    fn part_from_file_field_keeps_mime() {
        let field = FieldRecord::file("doc", "notes.bin", "application/custom", vec![1, 2, 3]);
        let part = Part::from(&field);
        assert_eq!(part.filename(), Some("notes.bin"));
        assert_eq!(part.content_type(), Some("application/custom"));
        assert_eq!(part.data().as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn form_empty() {
        let form = Form::new();
        assert!(form.parts().is_empty());
        assert!(form.boundary().starts_with("----CourierBoundary"));
        let (_, body) = form.into_body();
        assert!(body.ends_with(b"--\r\n"));
    }

    #[test]
    fn form_fields_keep_order() {
        let fields = [
            FieldRecord::scalar("b", "1"),
            FieldRecord::scalar("a", "2"),
        ];
        let form = Form::new().fields(&fields);
        let names: Vec<&str> = form.parts().iter().map(Part::name).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn form_encode() {
        let form = Form::with_boundary("boundary123")
            .fields(&[FieldRecord::scalar("user[name]", "Ann")])
            .part(Part::new("avatar", "PNG").with_filename("pic.png").with_content_type("image/png"));

        let (content_type, body) = form.into_body();
        assert_eq!(content_type, "multipart/form-data; boundary=boundary123");

        let body_str = String::from_utf8_lossy(&body);
        assert_eq!(
            body_str,
            "--boundary123\r\n\
             Content-Disposition: form-data; name=\"user[name]\"\r\n\
             \r\n\
             Ann\r\n\
             --boundary123\r\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"pic.png\"\r\n\
             Content-Type: image/png\r\n\
             \r\n\
             PNG\r\n\
             --boundary123--\r\n"
        );
    }

    #[test]
    fn form_escapes_quotes_in_names() {
        let form = Form::with_boundary("b").fields(&[FieldRecord::scalar("say \"hi\"", "x")]);
        let (_, body) = form.into_body();
        let body_str = String::from_utf8_lossy(&body);
        assert!(body_str.contains("name=\"say %22hi%22\""));
    }
}
