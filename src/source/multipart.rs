//! `multipart/form-data` request bodies.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Builds a `multipart/form-data` body, hiding boundary and CRLF framing.
///
/// ```
/// use matrix_reel::source::MultipartBuilder;
///
/// let mut form = MultipartBuilder::with_boundary("XyZ");
/// form.add_file_part("file", "video.mp4", "video/mp4", b"...");
/// assert_eq!(form.content_type(), "multipart/form-data; boundary=XyZ");
/// let body = form.build();
/// assert!(body.ends_with(b"\r\n--XyZ--\r\n"));
/// ```
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    /// Builder with a random boundary.
    pub fn new() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        Self::with_boundary(format!("----MatrixReelBoundary{token}"))
    }

    /// Builder with a caller-chosen boundary. The boundary must not occur in
    /// any part's content.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a plain text field.
    pub fn add_field(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_part();
        self.header(&format!("Content-Disposition: form-data; name=\"{name}\""));
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Append a file part with its own content type.
    pub fn add_file_part(
        &mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> &mut Self {
        self.open_part();
        self.header(&format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\""
        ));
        self.header(&format!("Content-Type: {content_type}"));
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Close the body with the final delimiter.
    pub fn build(mut self) -> Vec<u8> {
        self.body.extend_from_slice(b"--");
        self.body.extend_from_slice(self.boundary.as_bytes());
        self.body.extend_from_slice(b"--\r\n");
        self.body
    }

    fn open_part(&mut self) {
        self.body.extend_from_slice(b"--");
        self.body.extend_from_slice(self.boundary.as_bytes());
        self.body.extend_from_slice(b"\r\n");
    }

    fn header(&mut self, line: &str) {
        self.body.extend_from_slice(line.as_bytes());
        self.body.extend_from_slice(b"\r\n");
    }
}
