//! Adaptors that turn frame producers into timed, quantized frames.

use std::time::Duration;

use crate::animation::CompiledAsset;
use crate::compute::{CYCLE_FRAMES, EffectGenerator, FrameQuantizer, Grid, TimedFrame};
use crate::source::DecodedFrame;

use super::PlaybackState;

/// Anything the scheduler can pull frames from.
pub trait FrameFeed {
    /// Frame for the current state, or `None` once the feed is finished.
    fn next_frame(&mut self, state: &PlaybackState) -> Option<TimedFrame>;

    /// Modulus for the state's frame counter.
    fn period(&self) -> u64 {
        u64::MAX
    }
}

impl<F: FrameFeed + ?Sized> FrameFeed for Box<F> {
    fn next_frame(&mut self, state: &PlaybackState) -> Option<TimedFrame> {
        (**self).next_frame(state)
    }

    fn period(&self) -> u64 {
        (**self).period()
    }
}

/// Procedural effects at a fixed cadence. The counter is the time parameter.
pub struct ProceduralFeed {
    generator: EffectGenerator,
    interval: Duration,
    grid: Grid<u8>,
}

impl ProceduralFeed {
    pub fn new(generator: EffectGenerator, interval: Duration) -> Self {
        Self {
            generator,
            interval,
            grid: Grid::filled(0),
        }
    }
}

impl FrameFeed for ProceduralFeed {
    fn next_frame(&mut self, state: &PlaybackState) -> Option<TimedFrame> {
        // Counter wraps at CYCLE_FRAMES, so this never truncates.
        let t = state.counter as u32;
        let palette = self.generator.render_into(t, &mut self.grid);
        Some(TimedFrame::indexed(self.grid.clone(), palette, self.interval))
    }

    fn period(&self) -> u64 {
        CYCLE_FRAMES as u64
    }
}

/// Decoded media frames, quantized to packed RGB565 on the fly.
pub struct MediaFeed<I> {
    frames: I,
    quantizer: FrameQuantizer,
}

impl<I: Iterator<Item = DecodedFrame>> MediaFeed<I> {
    pub fn new(frames: I, quantizer: FrameQuantizer) -> Self {
        Self { frames, quantizer }
    }
}

impl<I: Iterator<Item = DecodedFrame>> FrameFeed for MediaFeed<I> {
    fn next_frame(&mut self, _state: &PlaybackState) -> Option<TimedFrame> {
        let decoded = self.frames.next()?;
        let grid = self.quantizer.quantize(&decoded.frame);
        Some(TimedFrame::packed(grid, decoded.duration_ms))
    }
}

/// Precompiled frames replayed with zero decode. The index wraps.
pub struct CompiledFeed {
    asset: CompiledAsset,
}

impl CompiledFeed {
    pub fn new(asset: CompiledAsset) -> Self {
        Self { asset }
    }
}

impl FrameFeed for CompiledFeed {
    fn next_frame(&mut self, state: &PlaybackState) -> Option<TimedFrame> {
        let index = (state.counter % self.period()) as usize;
        let (grid, duration_ms) = self.asset.frame(index)?;
        Some(TimedFrame::packed(grid.clone(), duration_ms))
    }

    fn period(&self) -> u64 {
        self.asset.len().max(1) as u64
    }
}
