//! Configuration types for display, sources and playback.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compute::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Default GIF streamed by the `remote_stream` source.
pub const DEFAULT_STREAM_URL: &str = "https://media1.tenor.com/m/1u15ulrFh1EAAAAd/asc.gif";

/// Default media resolver endpoint.
pub const DEFAULT_RESOLVER_URL: &str = "http://35.204.199.3:9000/";

/// Default video-to-GIF conversion endpoint.
pub const DEFAULT_CONVERSION_URL: &str = "http://35.204.199.3:3000/convert/video/to/gif";

/// Frame duration used when a container does not declare one.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Panel parameters handed to the display sink.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Where frames come from.
    pub source: SourceConfig,
    /// Timing and retry parameters.
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.display.validate()?;
        self.source.validate()?;
        self.playback.validate()
    }
}

/// Physical panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Panel width in pixels. Only 64 is supported.
    pub width: usize,
    /// Panel height in pixels. Only 32 is supported.
    pub height: usize,
    /// Bits per colour channel driven by the panel (1-8).
    pub bit_depth: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            bit_depth: 6,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width != DISPLAY_WIDTH || self.height != DISPLAY_HEIGHT {
            return Err(ConfigError::UnsupportedResolution {
                width: self.width,
                height: self.height,
            });
        }
        if !(1..=8).contains(&self.bit_depth) {
            return Err(ConfigError::InvalidBitDepth(self.bit_depth));
        }
        Ok(())
    }
}

/// Frame source selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Plasma/spiral/ripple colour fields.
    Procedural {
        /// Seed for cross-fade dithering (None = random).
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Animated image on local storage, decoded once.
    LocalAsset { path: PathBuf },
    /// Animated image fetched over HTTP, refetched every pass.
    RemoteStream {
        #[serde(default = "default_stream_url")]
        url: String,
    },
    /// Remote video resolved, downloaded and converted to an animated image.
    RemoteVideo(VideoConfig),
    /// Asset produced by `matrix-reel-compile`.
    CompiledAsset { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Procedural { seed: None }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SourceConfig::RemoteStream { url } => check_url("url", url),
            SourceConfig::RemoteVideo(video) => video.validate(),
            SourceConfig::LocalAsset { path } | SourceConfig::CompiledAsset { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::EmptyPath);
                }
                Ok(())
            }
            SourceConfig::Procedural { .. } => Ok(()),
        }
    }
}

fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

/// Remote video conversion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Service resolving a video page into a direct media URL.
    pub resolver_url: String,
    /// Service converting uploaded video into an animated GIF.
    pub conversion_url: String,
    /// Video identifier on the hosting site.
    pub video_id: String,
    /// Requested vertical resolution, as the resolver expects it.
    pub video_quality: String,
    /// Requested codec.
    pub codec: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            conversion_url: DEFAULT_CONVERSION_URL.to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
            video_quality: "144".to_string(),
            codec: "h264".to_string(),
        }
    }
}

impl VideoConfig {
    /// Page URL submitted to the resolver.
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.video_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("resolver_url", &self.resolver_url)?;
        check_url("conversion_url", &self.conversion_url)?;
        if self.video_id.is_empty() {
            return Err(ConfigError::EmptyVideoId);
        }
        Ok(())
    }
}

fn check_url(field: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            url: url.to_string(),
        })
    }
}

/// Playback timing and resilience parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Fixed wait between failed acquisitions of a network source.
    pub retry_delay_ms: u64,
    /// Target interval between procedural frames (~30 fps).
    pub frame_interval_ms: u64,
    /// Duration assumed when a container does not declare one.
    pub default_frame_duration_ms: u32,
    /// Connect/read timeout for HTTP requests.
    pub http_timeout_secs: u64,
    /// Stop after this many presented frames (None = run forever).
    pub max_frames: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 5000,
            frame_interval_ms: 33,
            default_frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            http_timeout_secs: 30,
            max_frames: None,
        }
    }
}

impl PlaybackConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidFrameInterval);
        }
        if self.default_frame_duration_ms == 0 {
            return Err(ConfigError::InvalidFrameDuration);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Display must be 64x32, got {width}x{height}")]
    UnsupportedResolution { width: usize, height: usize },
    #[error("Bit depth must be between 1 and 8, got {0}")]
    InvalidBitDepth(u8),
    #[error("Field `{field}` is not an http(s) URL: {url}")]
    InvalidUrl { field: &'static str, url: String },
    #[error("Asset path must not be empty")]
    EmptyPath,
    #[error("Video id must not be empty")]
    EmptyVideoId,
    #[error("Frame interval must be positive")]
    InvalidFrameInterval,
    #[error("Default frame duration must be positive")]
    InvalidFrameDuration,
}
