//! Frame pacing with per-frame latency compensation.

use std::time::Duration;

use log::{debug, info};

use super::{CancelToken, Clock, DisplaySink, FrameFeed, SinkError};
use crate::compute::TimedFrame;

/// Lifecycle of a [`PlaybackScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Running,
    Stopped,
}

/// Position within playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Frames presented so far. Never wraps.
    pub presented: u64,
    /// Frame counter, wrapping modulo `period`.
    pub counter: u64,
    period: u64,
}

impl PlaybackState {
    pub fn new(period: u64) -> Self {
        Self {
            presented: 0,
            counter: 0,
            period: period.max(1),
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn advance(&mut self) {
        self.presented += 1;
        self.counter = (self.counter + 1) % self.period;
    }
}

/// Time to sleep after a frame whose push took `elapsed`.
///
/// Only the current frame's latency is subtracted; drift accumulated over
/// earlier frames is not corrected. Never negative.
#[inline]
pub fn compensated_sleep(duration: Duration, elapsed: Duration) -> Duration {
    duration.saturating_sub(elapsed)
}

/// Timing summary for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub frames: u64,
    /// Frames whose push took at least their whole duration.
    pub overruns: u64,
    pub render_time: Duration,
    pub sleep_time: Duration,
}

impl PlaybackStats {
    /// Mean push latency per frame.
    pub fn mean_render_time(&self) -> Duration {
        if self.frames == 0 {
            return Duration::ZERO;
        }
        self.render_time / self.frames as u32
    }
}

/// Errors that end a playback run.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Drives a display sink at the cadence set by each frame's duration.
pub struct PlaybackScheduler<S, C> {
    sink: S,
    clock: C,
    cancel: CancelToken,
    phase: SchedulerPhase,
    max_frames: Option<u64>,
    stats: PlaybackStats,
}

impl<S: DisplaySink, C: Clock> PlaybackScheduler<S, C> {
    pub fn new(sink: S, clock: C, cancel: CancelToken) -> Self {
        Self {
            sink,
            clock,
            cancel,
            phase: SchedulerPhase::Idle,
            max_frames: None,
            stats: PlaybackStats::default(),
        }
    }

    /// Stop after `limit` presented frames.
    pub fn with_max_frames(mut self, limit: Option<u64>) -> Self {
        self.max_frames = limit;
        self
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Present one frame, then sleep out the rest of its duration.
    ///
    /// Returns the sleep that was scheduled.
    pub fn step(&mut self, frame: &TimedFrame) -> Result<Duration, PlaybackError> {
        let start = self.clock.now();
        self.sink.present(&frame.frame, &frame.colors)?;
        let elapsed = self.clock.now().saturating_sub(start);

        let sleep = compensated_sleep(frame.duration, elapsed);
        if sleep.is_zero() {
            self.stats.overruns += 1;
        }
        self.stats.frames += 1;
        self.stats.render_time += elapsed;
        self.stats.sleep_time += sleep;
        debug!(
            "Frame {}: push {:.2}ms, sleep {:.2}ms",
            self.stats.frames,
            elapsed.as_secs_f64() * 1000.0,
            sleep.as_secs_f64() * 1000.0
        );

        self.clock.sleep(sleep);
        Ok(sleep)
    }

    /// Pull frames from `feed` until it ends, the frame limit is reached or
    /// the cancel token fires.
    pub fn run(&mut self, feed: &mut dyn FrameFeed) -> Result<PlaybackStats, PlaybackError> {
        self.phase = SchedulerPhase::Running;
        let mut state = PlaybackState::new(feed.period());
        info!("Playback started");

        while !self.cancel.is_cancelled() {
            if self.max_frames.is_some_and(|limit| state.presented >= limit) {
                break;
            }
            let Some(frame) = feed.next_frame(&state) else {
                info!("Feed finished after {} frames", state.presented);
                break;
            };
            if let Err(e) = self.step(&frame) {
                self.phase = SchedulerPhase::Stopped;
                return Err(e);
            }
            state.advance();
        }

        self.phase = SchedulerPhase::Stopped;
        info!(
            "Playback stopped: {} frames, {} overruns",
            self.stats.frames, self.stats.overruns
        );
        Ok(self.stats)
    }
}
