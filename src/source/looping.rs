//! Endless replay for sources with no external dependency.

use log::error;

use super::{DecodedFrame, FrameSource, FrameStream};

/// Re-acquires its source whenever a pass ends.
///
/// Any failure ends the iteration; there is nothing to wait for when the
/// source is local.
pub struct Looping<S> {
    source: S,
    current: Option<FrameStream>,
    frames_in_pass: usize,
    passes: u64,
}

impl<S: FrameSource> Looping<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: None,
            frames_in_pass: 0,
            passes: 0,
        }
    }

    /// Number of passes opened so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl<S: FrameSource> Iterator for Looping<S> {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                match self.source.acquire() {
                    Ok(stream) => {
                        self.current = Some(stream);
                        self.passes += 1;
                    }
                    Err(e) => {
                        error!("Source failed: {e}");
                        return None;
                    }
                }
            }

            let stream = self.current.as_mut()?;
            match stream.next() {
                Some(Ok(frame)) => {
                    self.frames_in_pass += 1;
                    return Some(frame);
                }
                Some(Err(e)) => {
                    error!("Frame decode failed: {e}");
                    self.current = None;
                    return None;
                }
                None => {
                    self.current = None;
                    if self.frames_in_pass == 0 {
                        error!("Source pass yielded no frames");
                        return None;
                    }
                    self.frames_in_pass = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LocalAsset;
    use crate::source::test_utils::solid;

    #[test]
    fn test_index_wraps() {
        let asset = LocalAsset::from_frames(vec![
            solid([1, 0, 0], 10),
            solid([2, 0, 0], 20),
            solid([3, 0, 0], 30),
        ]);
        let mut looping = Looping::new(asset);

        let durations: Vec<u32> = looping.by_ref().take(7).map(|f| f.duration_ms).collect();
        assert_eq!(durations, vec![10, 20, 30, 10, 20, 30, 10]);
        assert_eq!(looping.passes(), 3);
    }

    #[test]
    fn test_empty_source_stops() {
        let mut looping = Looping::new(LocalAsset::from_frames(Vec::new()));
        assert!(looping.next().is_none());
    }
}
