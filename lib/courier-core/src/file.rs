//! Uploaded file handles for multipart bodies.
//!
//! A [`FileRef`] is a cheap, shareable handle to anything implementing
//! [`UploadedFile`]. The encoder only reads from it, and reads the whole
//! content eagerly when the body is flattened.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

/// Read-only capabilities of an uploaded file.
pub trait UploadedFile: fmt::Debug + Send + Sync {
    /// Filename as supplied by the client that uploaded it.
    fn original_filename(&self) -> &str;

    /// MIME type of the file.
    fn mime_type(&self) -> &str;

    /// Read the full content of the file.
    fn read_all_bytes(&self) -> std::io::Result<Bytes>;
}

/// Shared handle to an [`UploadedFile`].
///
/// Two handles are equal when they point at the same file object.
#[derive(Clone)]
pub struct FileRef(Arc<dyn UploadedFile>);

impl FileRef {
    /// Wrap a file implementation.
    #[must_use]
    pub fn new(file: impl UploadedFile + 'static) -> Self {
        Self(Arc::new(file))
    }

    /// File on disk; the MIME type is guessed from the extension.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::new(PathFile::new(path))
    }

    /// In-memory file; the MIME type is guessed from the filename.
    #[must_use]
    pub fn memory(filename: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self::new(MemoryFile::new(filename, contents))
    }

    /// Filename as supplied by the uploader.
    #[must_use]
    pub fn original_filename(&self) -> &str {
        self.0.original_filename()
    }

    /// MIME type of the file.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.0.mime_type()
    }

    /// Read the full content of the file.
    pub fn read_all_bytes(&self) -> std::io::Result<Bytes> {
        self.0.read_all_bytes()
    }
}

impl<F: UploadedFile + 'static> From<Arc<F>> for FileRef {
    fn from(file: Arc<F>) -> Self {
        Self(file)
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileRef").field(&self.0).finish()
    }
}

impl PartialEq for FileRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A file stored on the local filesystem.
#[derive(Debug, Clone)]
pub struct PathFile {
    path: PathBuf,
    filename: String,
    mime_type: String,
}

impl PathFile {
    /// Reference a file on disk.
    ///
    /// The original filename defaults to the last path component and the
    /// MIME type is guessed from its extension.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = guess_content_type(&filename).to_string();
        Self {
            path,
            filename,
            mime_type,
        }
    }

    /// Override the filename reported to the server.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Override the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Location on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UploadedFile for PathFile {
    fn original_filename(&self) -> &str {
        &self.filename
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn read_all_bytes(&self) -> std::io::Result<Bytes> {
        std::fs::read(&self.path).map(Bytes::from)
    }
}

/// A file held in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    filename: String,
    mime_type: String,
    contents: Bytes,
}

impl MemoryFile {
    /// Create an in-memory file, guessing its MIME type from the filename.
    #[must_use]
    pub fn new(filename: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let mime_type = guess_content_type(&filename).to_string();
        Self {
            filename,
            mime_type,
            contents: contents.into(),
        }
    }

    /// Override the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

impl UploadedFile for MemoryFile {
    fn original_filename(&self) -> &str {
        &self.filename
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn read_all_bytes(&self) -> std::io::Result<Bytes> {
        Ok(self.contents.clone())
    }
}

/// Guess the content type from a filename extension.
///
/// Unknown or missing extensions map to `application/octet-stream`.
#[must_use]
pub fn guess_content_type(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return "application/octet-stream";
    };

    match extension.to_ascii_lowercase().as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        // Text
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "md" => "text/markdown",
        // Archives
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" | "gzip" => "application/gzip",
        // Audio/Video
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn memory_file_capabilities() {
        let file = FileRef::memory("pic.png", vec![0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(file.original_filename(), "pic.png");
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.read_all_bytes().expect("read").as_ref(), &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn memory_file_mime_override() {
        let file = FileRef::new(MemoryFile::new("data.bin", "x").with_mime_type("application/custom"));
        assert_eq!(file.mime_type(), "application/custom");
    }

    #[test]
    fn path_file_reads_eagerly() {
        let mut tmp = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("tempfile");
        tmp.write_all(b"hello from disk").expect("write");

        let file = PathFile::new(tmp.path());
        assert_eq!(file.mime_type(), "text/plain");
        assert!(file.original_filename().ends_with(".txt"));
        assert_eq!(file.read_all_bytes().expect("read").as_ref(), b"hello from disk");
    }

    #[test]
    fn path_file_missing_is_io_error() {
        let file = PathFile::new("/definitely/not/here/report.pdf").with_filename("report.pdf");
        assert_eq!(file.original_filename(), "report.pdf");
        assert_eq!(file.mime_type(), "application/pdf");
        let err = file.read_all_bytes().expect_err("missing file");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn file_ref_equality_is_identity() {
        let a = FileRef::memory("a.txt", "same");
        let b = FileRef::memory("a.txt", "same");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn guess_content_type_common() {
        assert_eq!(guess_content_type("photo.jpg"), "image/jpeg");
        assert_eq!(guess_content_type("PHOTO.JPEG"), "image/jpeg");
        assert_eq!(guess_content_type("doc.pdf"), "application/pdf");
        assert_eq!(guess_content_type("Makefile"), "application/octet-stream");
        assert_eq!(guess_content_type("unknown.xyz"), "application/octet-stream");
    }
}
