//! Blocking HTTP access for network sources.

use std::io::Read;
use std::time::Duration;

use log::debug;

use super::SourceError;

/// Upper bound on any response body (animated GIFs and short videos).
pub const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Minimal blocking HTTP client. Bodies are always fully buffered.
pub trait HttpClient {
    /// `GET url` and return the body.
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError>;

    /// `POST url` with the given headers and body, returning the response body.
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<u8>, SourceError>;
}

/// [`HttpClient`] backed by `ureq`.
pub struct UreqClient {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl UreqClient {
    /// Client with the given connect and read timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self {
            agent,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    fn read_body(&self, url: &str, response: ureq::Response) -> Result<Vec<u8>, SourceError> {
        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_body_bytes)
            .read_to_end(&mut body)
            .map_err(|e| SourceError::fetch(url, e))?;
        debug!("{} bytes from {}", body.len(), url);
        Ok(body)
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| SourceError::fetch(url, e))?;
        self.read_body(url, response)
    }

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<u8>, SourceError> {
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        let response = request
            .send_bytes(body)
            .map_err(|e| SourceError::fetch(url, e))?;
        self.read_body(url, response)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        (**self).get(url)
    }

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<u8>, SourceError> {
        (**self).post(url, headers, body)
    }
}
