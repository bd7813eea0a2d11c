//! Asset recorder writing quantized frames to disk.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::format::{
    AssetFlags, AssetHeader, CompressionType, FrameIndex, compress_lz4, encode_frame,
};
use crate::compute::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Grid};

/// Configuration for asset recording.
#[derive(Debug, Clone, Default)]
pub struct RecorderConfig {
    /// Compression type to use.
    pub compression: CompressionType,
}

/// Writes frames to a sibling temporary file and renames it over the
/// destination on [`finalize`](AssetRecorder::finalize).
///
/// The temporary file is removed when the recorder is dropped unfinalized
/// or when finalizing fails, so a failed run never leaves output behind.
///
/// ```ignore
/// let mut recorder = AssetRecorder::new("clip.mxr", RecorderConfig::default())?;
/// for (grid, ms) in frames {
///     recorder.record_frame(&grid, ms)?;
/// }
/// recorder.finalize()?;
/// ```
pub struct AssetRecorder {
    writer: Option<BufWriter<File>>,
    temp_path: PathBuf,
    final_path: PathBuf,
    header: AssetHeader,
    frame_indices: Vec<FrameIndex>,
    encode_buffer: Vec<u8>,
}

/// `dir/.name.partial` next to `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());
    path.with_file_name(format!(".{name}.partial"))
}

fn finalized() -> io::Error {
    io::Error::other("Recorder already finalized")
}

impl AssetRecorder {
    /// Create a recorder targeting `path`.
    pub fn new<P: AsRef<Path>>(path: P, config: RecorderConfig) -> io::Result<Self> {
        let final_path = path.as_ref().to_path_buf();
        let temp_path = temp_path_for(&final_path);
        let mut writer = BufWriter::new(File::create(&temp_path)?);

        let header = AssetHeader {
            width: DISPLAY_WIDTH as u16,
            height: DISPLAY_HEIGHT as u16,
            frame_count: 0, // rewritten on finalize
            flags: AssetFlags {
                compression: config.compression,
            },
        };
        header.write_to(&mut writer)?;

        Ok(Self {
            writer: Some(writer),
            temp_path,
            final_path,
            header,
            frame_indices: Vec::new(),
            encode_buffer: Vec::new(),
        })
    }

    /// Append one frame.
    pub fn record_frame(&mut self, grid: &Grid<u16>, duration_ms: u32) -> io::Result<()> {
        encode_frame(grid.cells(), &mut self.encode_buffer);
        let compressed;
        let payload: &[u8] = match self.header.flags.compression {
            CompressionType::None => &self.encode_buffer,
            CompressionType::Lz4 => {
                compressed = compress_lz4(&self.encode_buffer);
                &compressed
            }
        };

        let writer = self.writer.as_mut().ok_or_else(finalized)?;
        let offset = writer.stream_position()?;
        writer.write_all(payload)?;
        self.frame_indices.push(FrameIndex {
            offset,
            size: payload.len() as u32,
            duration_ms,
        });
        Ok(())
    }

    /// Write the index table, patch the header and move the file into place.
    pub fn finalize(mut self) -> io::Result<AssetStats> {
        if self.frame_indices.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Refusing to write an asset with no frames",
            ));
        }

        let writer = self.writer.take().ok_or_else(finalized)?;
        match self.write_trailer(writer) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                let _ = fs::remove_file(&self.temp_path);
                Err(e)
            }
        }
    }

    fn write_trailer(&mut self, mut writer: BufWriter<File>) -> io::Result<AssetStats> {
        let index_offset = writer.stream_position()?;
        for index in &self.frame_indices {
            index.write_to(&mut writer)?;
        }

        self.header.frame_count = self.frame_indices.len() as u32;
        writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        fs::rename(&self.temp_path, &self.final_path)?;

        let frame_count = self.frame_indices.len() as u64;
        let payload_bytes = index_offset.saturating_sub(AssetHeader::SIZE as u64);
        Ok(AssetStats {
            frame_count,
            total_bytes: index_offset + frame_count * FrameIndex::SIZE as u64,
            average_frame_size: payload_bytes / frame_count,
            compression: self.header.flags.compression,
        })
    }

    /// Get number of frames recorded so far.
    pub fn frames_written(&self) -> u32 {
        self.frame_indices.len() as u32
    }
}

impl Drop for AssetRecorder {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Statistics from a recording session.
#[derive(Debug, Clone)]
pub struct AssetStats {
    pub frame_count: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Average stored frame size.
    pub average_frame_size: u64,
    pub compression: CompressionType,
}

impl std::fmt::Display for AssetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame avg ({:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::format::FRAME_BYTES;
    use tempfile::tempdir;

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basic.mxr");

        let mut recorder = AssetRecorder::new(&path, RecorderConfig::default()).unwrap();
        for i in 0..4 {
            recorder.record_frame(&Grid::filled(i), 50).unwrap();
        }
        let stats = recorder.finalize().unwrap();

        assert_eq!(stats.frame_count, 4);
        assert_eq!(stats.average_frame_size, FRAME_BYTES as u64);
        let len = fs::metadata(&path).unwrap().len();
        assert_eq!(len, stats.total_bytes);
        assert_eq!(
            len,
            (AssetHeader::SIZE + 4 * FRAME_BYTES + 4 * FrameIndex::SIZE) as u64
        );
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taken.mxr");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let mut recorder = AssetRecorder::new(&path, RecorderConfig::default()).unwrap();
        recorder.record_frame(&Grid::filled(3), 10).unwrap();
        assert!(recorder.finalize().is_err());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken.mxr")]);
        assert!(path.is_dir());
    }

    #[test]
    fn test_no_output_until_finalize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pending.mxr");

        let mut recorder = AssetRecorder::new(&path, RecorderConfig::default()).unwrap();
        recorder.record_frame(&Grid::filled(1), 10).unwrap();
        assert!(!path.exists());

        drop(recorder);
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_recording_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.mxr");

        let recorder = AssetRecorder::new(&path, RecorderConfig::default()).unwrap();
        assert!(recorder.finalize().is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
