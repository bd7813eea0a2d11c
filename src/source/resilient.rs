//! Fixed-delay, unbounded retry around network sources.

use std::time::Duration;

use log::{info, warn};

use super::{DecodedFrame, FrameSource, FrameStream, SourceError};
use crate::playback::{CancelToken, Clock};

/// Counters describing a resilient source's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    /// Successful acquisitions.
    pub acquisitions: u64,
    /// Failures reported (each followed by one wait).
    pub failures: u64,
}

/// Turns a failure-prone source into an endless frame sequence.
///
/// Any failure while acquiring or while decoding a pass is reported, followed
/// by a wait of `delay` and a fresh acquisition. There is no attempt limit and
/// no backoff growth. A pass that ends normally is re-acquired without
/// waiting; a pass that ends without yielding a frame counts as a failure.
/// Iteration only ends once `cancel` fires.
pub struct Resilient<S, C> {
    source: S,
    clock: C,
    delay: Duration,
    cancel: CancelToken,
    current: Option<FrameStream>,
    frames_in_pass: usize,
    stats: RetryStats,
}

impl<S: FrameSource, C: Clock> Resilient<S, C> {
    pub fn new(source: S, clock: C, delay: Duration, cancel: CancelToken) -> Self {
        Self {
            source,
            clock,
            delay,
            cancel,
            current: None,
            frames_in_pass: 0,
            stats: RetryStats::default(),
        }
    }

    pub fn stats(&self) -> RetryStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn fail(&mut self, error: SourceError) {
        self.current = None;
        self.frames_in_pass = 0;
        self.stats.failures += 1;
        warn!(
            "{error}; retrying in {:.1}s (failure #{})",
            self.delay.as_secs_f32(),
            self.stats.failures
        );
        self.clock.sleep(self.delay);
    }
}

impl<S: FrameSource, C: Clock> Iterator for Resilient<S, C> {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            if self.current.is_none() {
                match self.source.acquire() {
                    Ok(stream) => {
                        self.stats.acquisitions += 1;
                        info!("Source acquired (pass #{})", self.stats.acquisitions);
                        self.current = Some(stream);
                    }
                    Err(e) => {
                        self.fail(e);
                        continue;
                    }
                }
            }

            let Some(stream) = self.current.as_mut() else {
                continue;
            };
            match stream.next() {
                Some(Ok(frame)) => {
                    self.frames_in_pass += 1;
                    return Some(frame);
                }
                Some(Err(e)) => self.fail(e),
                None if self.frames_in_pass == 0 => self.fail(SourceError::Empty),
                None => {
                    self.current = None;
                    self.frames_in_pass = 0;
                }
            }
        }
    }
}
