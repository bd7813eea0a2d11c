//! Playback - Pacing quantized frames onto a display.
//!
//! The scheduler owns the display sink and a clock. Frames come from a
//! [`FrameFeed`]: procedural effects, media decoded from a source, or a
//! precompiled asset. [`open_feed`] builds the right feed for a
//! configuration.

mod clock;
mod feed;
mod scheduler;
mod sink;

pub use clock::{CancelToken, Clock, ManualClock, SystemClock};
pub use feed::{CompiledFeed, FrameFeed, MediaFeed, ProceduralFeed};
pub use scheduler::{
    PlaybackError, PlaybackScheduler, PlaybackState, PlaybackStats, SchedulerPhase,
    compensated_sleep,
};
pub use sink::{AnsiSink, DisplaySink, MemorySink, SinkError};

use log::info;

use crate::animation::CompiledAsset;
use crate::compute::{EffectGenerator, FrameQuantizer};
use crate::schema::{AppConfig, PlaybackConfig, SourceConfig};
use crate::source::{
    FrameSource, LocalAsset, Looping, RemoteStream, RemoteVideo, Resilient, SourceError,
    UreqClient,
};

/// Build the frame feed described by `config`.
///
/// Network sources are wrapped in [`Resilient`] and never fail here; local
/// sources are opened eagerly so a bad path is reported before playback.
pub fn open_feed(
    config: &AppConfig,
    cancel: &CancelToken,
) -> Result<Box<dyn FrameFeed>, SourceError> {
    let playback = &config.playback;
    let default_ms = playback.default_frame_duration_ms;
    let quantizer = FrameQuantizer::default();

    let feed: Box<dyn FrameFeed> = match &config.source {
        SourceConfig::Procedural { seed } => {
            let generator = match seed {
                Some(seed) => EffectGenerator::new(*seed),
                None => EffectGenerator::random(),
            };
            Box::new(ProceduralFeed::new(generator, playback.frame_interval()))
        }
        SourceConfig::LocalAsset { path } => {
            let asset = LocalAsset::open(path, default_ms)?;
            Box::new(MediaFeed::new(Looping::new(asset), quantizer))
        }
        SourceConfig::RemoteStream { url } => {
            let client = UreqClient::new(playback.http_timeout());
            let source = RemoteStream::new(client, url.clone(), default_ms);
            Box::new(MediaFeed::new(resilient(source, playback, cancel), quantizer))
        }
        SourceConfig::RemoteVideo(video) => {
            let client = UreqClient::new(playback.http_timeout());
            let source = RemoteVideo::new(client, video.clone(), default_ms);
            Box::new(MediaFeed::new(resilient(source, playback, cancel), quantizer))
        }
        SourceConfig::CompiledAsset { path } => {
            let asset = CompiledAsset::load(path)?;
            info!("Loaded {} compiled frames from {}", asset.len(), path.display());
            Box::new(CompiledFeed::new(asset))
        }
    };
    Ok(feed)
}

fn resilient<S: FrameSource>(
    source: S,
    playback: &PlaybackConfig,
    cancel: &CancelToken,
) -> Resilient<S, SystemClock> {
    Resilient::new(
        source,
        SystemClock::new(cancel.clone()),
        playback.retry_delay(),
        cancel.clone(),
    )
}
