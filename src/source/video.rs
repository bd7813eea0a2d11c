//! Remote video resolved, downloaded and converted to an animated image.
//!
//! One acquisition performs three requests:
//!
//! 1. `POST resolver` with `{url, videoQuality, youtubeVideoCodec}`; the
//!    answer must have status `stream` or `tunnel` and carry a media `url`.
//! 2. `GET` the media URL for the raw video bytes.
//! 3. `POST conversion` with the video as a single multipart file part; the
//!    response body is an animated image decoded like a remote stream.

use log::info;
use serde::{Deserialize, Serialize};

use super::{FrameSource, FrameStream, HttpClient, MultipartBuilder, SourceError, decode_frames};
use crate::schema::VideoConfig;

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    url: String,
    #[serde(rename = "videoQuality")]
    video_quality: &'a str,
    #[serde(rename = "youtubeVideoCodec")]
    codec: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    status: String,
    #[serde(default)]
    url: Option<String>,
}

/// Statuses for which the resolver hands out a downloadable URL.
const ACCEPTED_STATUSES: [&str; 2] = ["stream", "tunnel"];

/// Remote video conversion source.
pub struct RemoteVideo<C> {
    client: C,
    config: VideoConfig,
    default_duration_ms: u32,
}

impl<C: HttpClient> RemoteVideo<C> {
    pub fn new(client: C, config: VideoConfig, default_duration_ms: u32) -> Self {
        Self {
            client,
            config,
            default_duration_ms,
        }
    }

    /// Ask the resolver for a direct media URL.
    pub fn resolve_media_url(&self) -> Result<String, SourceError> {
        let request = ResolveRequest {
            url: self.config.watch_url(),
            video_quality: &self.config.video_quality,
            codec: &self.config.codec,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| SourceError::Resolve(format!("encode request: {e}")))?;

        let response = self.client.post(
            &self.config.resolver_url,
            &[
                ("Accept", "application/json"),
                ("Content-Type", "application/json"),
            ],
            &body,
        )?;

        let parsed: ResolveResponse = serde_json::from_slice(&response)
            .map_err(|e| SourceError::Resolve(format!("malformed response: {e}")))?;

        if !ACCEPTED_STATUSES.contains(&parsed.status.as_str()) {
            return Err(SourceError::Resolve(format!(
                "unexpected status `{}`",
                parsed.status
            )));
        }
        parsed
            .url
            .ok_or_else(|| SourceError::Resolve("response carries no url".to_string()))
    }

    /// Upload video bytes and return the converted animated image.
    pub fn convert(&self, video: &[u8]) -> Result<Vec<u8>, SourceError> {
        let mut form = MultipartBuilder::new();
        form.add_file_part("file", "video.mp4", "video/mp4", video);
        let content_type = form.content_type();
        let body = form.build();
        self.client.post(
            &self.config.conversion_url,
            &[("Content-Type", content_type.as_str())],
            &body,
        )
    }
}

impl<C: HttpClient> FrameSource for RemoteVideo<C> {
    fn acquire(&mut self) -> Result<FrameStream, SourceError> {
        info!("Resolving video {}", self.config.video_id);
        let media_url = self.resolve_media_url()?;

        info!("Downloading video");
        let video = self.client.get(&media_url)?;

        info!("Converting {} bytes of video", video.len());
        let animation = self.convert(&video)?;
        decode_frames(animation, self.default_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_utils::{FakeHttp, gif_bytes};

    fn config() -> VideoConfig {
        VideoConfig {
            resolver_url: "http://resolver/".to_string(),
            conversion_url: "http://convert/gif".to_string(),
            video_id: "abc123".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_acquisition() {
        let gif = gif_bytes(&[([200, 0, 0], 50), ([0, 200, 0], 50)], 8, 4);
        let http = FakeHttp::with_responses(vec![
            Ok(br#"{"status": "tunnel", "url": "http://media/v.mp4"}"#.to_vec()),
            Ok(b"MP4DATA".to_vec()),
            Ok(gif),
        ]);
        let mut source = RemoteVideo::new(&http, config(), 100);

        let frames: Vec<_> = source.acquire().unwrap().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 2);

        let requests = http.requests.borrow();
        assert_eq!(requests.len(), 3);

        let resolve = &requests[0];
        assert_eq!(resolve.method, "POST");
        assert_eq!(resolve.url, "http://resolver/");
        assert!(
            resolve
                .headers
                .contains(&("Accept".to_string(), "application/json".to_string()))
        );
        let json: serde_json::Value = serde_json::from_slice(&resolve.body).unwrap();
        assert_eq!(json["url"], "https://youtube.com/watch?v=abc123");
        assert_eq!(json["videoQuality"], "144");
        assert_eq!(json["youtubeVideoCodec"], "h264");

        assert_eq!(requests[1].method, "GET");
        assert_eq!(requests[1].url, "http://media/v.mp4");

        let upload = &requests[2];
        assert_eq!(upload.url, "http://convert/gif");
        let (_, content_type) = &upload.headers[0];
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let body = String::from_utf8_lossy(&upload.body);
        assert!(body.contains("filename=\"video.mp4\""));
        assert!(body.contains("Content-Type: video/mp4\r\n\r\nMP4DATA\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn test_rejects_unexpected_status() {
        let http = FakeHttp::with_responses(vec![Ok(
            br#"{"status": "error", "error": {"code": "rate"}}"#.to_vec(),
        )]);
        let mut source = RemoteVideo::new(&http, config(), 100);
        let err = source.acquire().err().unwrap();
        assert!(matches!(err, SourceError::Resolve(_)));
        assert!(err.is_fetch());
        // Nothing was downloaded after the bad answer.
        assert_eq!(http.requests.borrow().len(), 1);
    }

    #[test]
    fn test_stream_status_without_url() {
        let http = FakeHttp::with_responses(vec![Ok(br#"{"status": "stream"}"#.to_vec())]);
        let source = RemoteVideo::new(&http, config(), 100);
        assert!(matches!(
            source.resolve_media_url(),
            Err(SourceError::Resolve(_))
        ));
    }
}
