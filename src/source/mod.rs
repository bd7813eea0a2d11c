//! Frame sources - Where raw frames come from.
//!
//! Every source hands out *passes*: a call to [`FrameSource::acquire`] opens
//! one lazy, finite pass over the source's frames. Endless playback is built
//! on top by re-acquiring when a pass ends:
//!
//! - [`Looping`] re-acquires straight away and stops on the first failure
//!   (used for sources without external dependencies).
//! - [`Resilient`] reports failures, waits a fixed delay and re-acquires,
//!   forever (used for network sources).
//!
//! Restarting never resumes internal state; it always goes back through
//! `acquire`, so a network source refetches its body on every pass.

mod decode;
mod http;
mod local;
mod looping;
mod multipart;
mod remote;
mod resilient;
mod video;

pub use decode::{decode_all, decode_frames};
pub use http::{HttpClient, UreqClient};
pub use local::LocalAsset;
pub use looping::Looping;
pub use multipart::MultipartBuilder;
pub use remote::RemoteStream;
pub use resilient::{Resilient, RetryStats};
pub use video::RemoteVideo;

use std::io;

use crate::compute::{FrameError, RawFrame};

/// One decoded frame and how long it should stay on screen.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub frame: RawFrame,
    /// Display time in milliseconds, always positive.
    pub duration_ms: u32,
}

/// A single lazy pass over a source's frames.
pub type FrameStream = Box<dyn Iterator<Item = Result<DecodedFrame, SourceError>>>;

/// Anything that can open passes over raw frames.
pub trait FrameSource {
    /// Open a new pass. Calling again after exhaustion or failure restarts
    /// the source from scratch.
    fn acquire(&mut self) -> Result<FrameStream, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn acquire(&mut self) -> Result<FrameStream, SourceError> {
        (**self).acquire()
    }
}

/// Errors raised while acquiring or decoding a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or service failure.
    #[error("Fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    /// The media resolver answered with something unusable.
    #[error("Media resolver error: {0}")]
    Resolve(String),
    /// Body or file is not a valid container, or a frame failed to decode.
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A pass finished without yielding a single frame.
    #[error("Source produced no frames")]
    Empty,
}

impl SourceError {
    /// Whether the failure came from the network side.
    pub fn is_fetch(&self) -> bool {
        matches!(self, SourceError::Fetch { .. } | SourceError::Resolve(_))
    }

    pub(crate) fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        SourceError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<image::ImageError> for SourceError {
    fn from(e: image::ImageError) -> Self {
        SourceError::Decode(e.to_string())
    }
}

impl From<FrameError> for SourceError {
    fn from(e: FrameError) -> Self {
        SourceError::Decode(e.to_string())
    }
}
