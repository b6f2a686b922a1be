//! Uploaded and stored files.

use bytes::Bytes;

/// A file received from a form upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name as sent by the browser, without any directory part.
    pub file_name: String,
    /// Content type as sent by the browser.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileUpload {
    /// Create an upload, stripping any client-side directory from the name.
    #[must_use]
    pub fn new(file_name: &str, content_type: Option<String>, bytes: Bytes) -> Self {
        let file_name = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Extension including the leading dot (`".pdf"`), case preserved.
    ///
    /// Returns an empty string when the name has no extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        extension_of(&self.file_name)
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A file read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Extension of `file_name` including the leading dot, or `""`.
///
/// A leading dot alone (`.env`) is not treated as an extension.
#[must_use]
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => "",
        Some(pos) => file_name.get(pos..).unwrap_or_default(),
    }
}
