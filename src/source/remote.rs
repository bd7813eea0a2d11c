//! Animated image fetched from a fixed URL.

use log::info;

use super::{FrameSource, FrameStream, HttpClient, SourceError, decode_frames};

/// Remote animated image. Every pass performs a full refetch.
pub struct RemoteStream<C> {
    client: C,
    url: String,
    default_duration_ms: u32,
}

impl<C: HttpClient> RemoteStream<C> {
    pub fn new(client: C, url: impl Into<String>, default_duration_ms: u32) -> Self {
        Self {
            client,
            url: url.into(),
            default_duration_ms,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<C: HttpClient> FrameSource for RemoteStream<C> {
    fn acquire(&mut self) -> Result<FrameStream, SourceError> {
        info!("Fetching animation from {}", self.url);
        let body = self.client.get(&self.url)?;
        decode_frames(body, self.default_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_utils::{FakeHttp, gif_bytes};

    #[test]
    fn test_each_pass_refetches() {
        let gif = gif_bytes(&[([10, 20, 30], 40)], 4, 4);
        let http = FakeHttp::with_responses(vec![Ok(gif.clone()), Ok(gif)]);
        let mut stream = RemoteStream::new(&http, "http://host/a.gif", 100);

        for _ in 0..2 {
            let frames: Vec<_> = stream.acquire().unwrap().collect();
            assert_eq!(frames.len(), 1);
        }

        let requests = http.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.method == "GET" && r.url == "http://host/a.gif"));
    }

    #[test]
    fn test_fetch_error_propagates() {
        let http = FakeHttp::with_responses(vec![Err(SourceError::fetch("http://x", "refused"))]);
        let mut stream = RemoteStream::new(&http, "http://x", 100);
        assert!(matches!(stream.acquire(), Err(e) if e.is_fetch()));
    }

    #[test]
    fn test_html_body_is_decode_error() {
        let http = FakeHttp::with_responses(vec![Ok(b"<html>rate limited</html>".to_vec())]);
        let mut stream = RemoteStream::new(&http, "http://x", 100);
        assert!(matches!(stream.acquire(), Err(SourceError::Decode(_))));
    }
}
