//! Matrix Reel - Animated frame pipeline for 64x32 RGB LED matrices.
//!
//! Frames come from procedural effects, animated images (local or fetched
//! over HTTP), remote videos converted on the fly, or assets compiled ahead
//! of time. Everything is reduced to the panel's fixed 64x32 grid and paced
//! onto a display sink by per-frame durations.
//!
//! # Architecture
//!
//! - `schema`: Configuration types with validation
//! - `compute`: Frame data model, quantizer, palettes and procedural effects
//! - `source`: Frame sources, container decoding and retry handling
//! - `playback`: Display sinks, clocks and the playback scheduler
//! - `animation`: Compiled asset format and the offline compiler
//!
//! # Example
//!
//! ```rust,no_run
//! use matrix_reel::{
//!     playback::{AnsiSink, CancelToken, PlaybackScheduler, SystemClock, open_feed},
//!     schema::{AppConfig, SourceConfig},
//! };
//!
//! let config = AppConfig {
//!     source: SourceConfig::Procedural { seed: Some(7) },
//!     ..Default::default()
//! };
//!
//! let cancel = CancelToken::new();
//! let mut feed = open_feed(&config, &cancel).unwrap();
//! let sink = AnsiSink::new(std::io::stdout(), &config.display).unwrap();
//! let mut scheduler = PlaybackScheduler::new(sink, SystemClock::new(cancel.clone()), cancel)
//!     .with_max_frames(Some(300));
//!
//! let stats = scheduler.run(&mut *feed).unwrap();
//! println!("{} frames, {} overruns", stats.frames, stats.overruns);
//! ```

pub mod animation;
pub mod compute;
pub mod playback;
pub mod schema;
pub mod source;

// Re-export commonly used types
pub use animation::CompiledAsset;
pub use compute::{EffectGenerator, FrameQuantizer, QuantizedFrame, RawFrame};
pub use playback::{PlaybackScheduler, open_feed};
pub use schema::AppConfig;
pub use source::{FrameSource, Resilient};
