//! Animated image stored on local disk.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::info;

use super::{DecodedFrame, FrameSource, FrameStream, SourceError, decode_all};

/// Local animated image, decoded once and replayed from memory.
pub struct LocalAsset {
    frames: Rc<[DecodedFrame]>,
}

impl LocalAsset {
    /// Read and fully decode `path`.
    pub fn open<P: AsRef<Path>>(path: P, default_duration_ms: u32) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let frames = decode_all(bytes, default_duration_ms)?;
        if frames.is_empty() {
            return Err(SourceError::Empty);
        }
        info!("Decoded {} frames from {}", frames.len(), path.display());
        Ok(Self {
            frames: frames.into(),
        })
    }

    /// Asset backed by frames that are already decoded.
    pub fn from_frames(frames: Vec<DecodedFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for LocalAsset {
    /// Replays the cached frame list; never touches the disk again.
    fn acquire(&mut self) -> Result<FrameStream, SourceError> {
        if self.frames.is_empty() {
            return Err(SourceError::Empty);
        }
        let frames = Rc::clone(&self.frames);
        Ok(Box::new(
            (0..frames.len()).map(move |i| Ok(frames[i].clone())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_utils::gif_bytes;
    use std::io;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        fs::write(&path, gif_bytes(&[([255, 0, 0], 30), ([0, 255, 0], 60)], 8, 8)).unwrap();

        let mut asset = LocalAsset::open(&path, 100).unwrap();
        assert_eq!(asset.frame_count(), 2);

        // Deleting the file proves replays come from memory.
        fs::remove_file(&path).unwrap();
        for _ in 0..3 {
            let durations: Vec<u32> = asset
                .acquire()
                .unwrap()
                .map(|f| f.unwrap().duration_ms)
                .collect();
            assert_eq!(durations, vec![30, 60]);
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = LocalAsset::open(dir.path().join("nope.gif"), 100);
        match result {
            Err(SourceError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_empty_asset_refuses_acquire() {
        let mut asset = LocalAsset::from_frames(Vec::new());
        assert!(matches!(asset.acquire(), Err(SourceError::Empty)));
    }
}
