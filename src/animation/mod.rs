//! Compiled assets: fully quantized animations stored for zero-decode replay.
//!
//! # File Format
//!
//! The `.mxr` format stores packed RGB565 frames with optional compression:
//!
//! ```text
//! Header (32 bytes):
//!   Magic: "MXRL" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression in the low nibble)
//!   Width: u16 (always 64)
//!   Height: u16 (always 32)
//!   Frame count: u32
//!   Reserved: 16 bytes
//!
//! Frame data (variable):
//!   2048 little-endian u16 cells per frame, row-major
//!   Optionally LZ4 compressed
//!
//! Frame index table (frame_count * 16 bytes, at end of file):
//!   Offset: u64
//!   Stored size: u32
//!   Duration: u32 (milliseconds)
//! ```
//!
//! Paths ending in `.json` use a plain layout instead:
//! `{"frames": [[[u16; 64]; 32], ...], "durations": [u32, ...]}`.

mod asset;
mod compiler;
mod format;
mod player;
mod recorder;

pub use asset::CompiledAsset;
pub use compiler::{CompileArgs, CompileError, UsageError, compile, compile_file};
pub use format::{
    ASSET_MAGIC, ASSET_VERSION, AssetFlags, AssetHeader, CompressionType, FRAME_BYTES, FrameIndex,
};
pub use player::{AssetPlayer, FrameIterator};
pub use recorder::{AssetRecorder, AssetStats, RecorderConfig};
