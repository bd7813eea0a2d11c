//! Reader for compiled assets.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::format::{AssetHeader, CompressionType, FrameIndex, decode_frame, decompress_lz4};
use crate::compute::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Grid, MAX_PACKED_COLOR};

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Random-access reader over a compiled asset file.
///
/// ```ignore
/// let mut player = AssetPlayer::open("clip.mxr")?;
/// for frame in player.frames() {
///     let (grid, duration_ms) = frame?;
/// }
/// ```
pub struct AssetPlayer {
    reader: BufReader<File>,
    header: AssetHeader,
    frame_indices: Vec<FrameIndex>,
    read_buffer: Vec<u8>,
}

impl AssetPlayer {
    /// Open and validate an asset file.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = AssetHeader::read_from(&mut reader)?;

        if (header.width as usize, header.height as usize) != (DISPLAY_WIDTH, DISPLAY_HEIGHT) {
            return Err(invalid(format!(
                "Asset is {}x{}, expected {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}",
                header.width, header.height
            )));
        }
        if header.frame_count == 0 {
            return Err(invalid("Asset contains no frames".to_string()));
        }

        let index_size = header.frame_count as u64 * FrameIndex::SIZE as u64;
        let file_len = reader.seek(SeekFrom::End(0))?;
        let index_start = file_len
            .checked_sub(index_size)
            .filter(|&start| start >= AssetHeader::SIZE as u64)
            .ok_or_else(|| invalid("Asset truncated before frame index".to_string()))?;
        reader.seek(SeekFrom::Start(index_start))?;

        let mut frame_indices = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            let index = FrameIndex::read_from(&mut reader)?;
            if index.offset + index.size as u64 > index_start {
                return Err(invalid(format!(
                    "Frame at offset {} overruns the index table",
                    index.offset
                )));
            }
            if index.duration_ms == 0 {
                return Err(invalid(format!(
                    "Frame {} has a zero duration",
                    frame_indices.len()
                )));
            }
            frame_indices.push(index);
        }

        Ok(Self {
            reader,
            header,
            frame_indices,
            read_buffer: Vec::new(),
        })
    }

    pub fn header(&self) -> &AssetHeader {
        &self.header
    }

    pub fn frame_count(&self) -> usize {
        self.frame_indices.len()
    }

    /// Per-frame durations in file order.
    pub fn durations(&self) -> Vec<u32> {
        self.frame_indices.iter().map(|i| i.duration_ms).collect()
    }

    /// Read a specific frame and its duration.
    pub fn read_frame(&mut self, frame_index: usize) -> io::Result<(Grid<u16>, u32)> {
        let index = *self.frame_indices.get(frame_index).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame index {} out of range ({} frames)",
                    frame_index,
                    self.frame_indices.len()
                ),
            )
        })?;

        self.reader.seek(SeekFrom::Start(index.offset))?;
        self.read_buffer.resize(index.size as usize, 0);
        self.reader.read_exact(&mut self.read_buffer)?;

        let cells = match self.header.flags.compression {
            CompressionType::None => decode_frame(&self.read_buffer)?,
            CompressionType::Lz4 => decode_frame(&decompress_lz4(&self.read_buffer)?)?,
        };
        if cells.iter().any(|&c| c > MAX_PACKED_COLOR) {
            return Err(invalid(format!(
                "Frame {frame_index} holds a colour above {MAX_PACKED_COLOR}"
            )));
        }
        let grid = Grid::from_cells(cells).map_err(|e| invalid(e.to_string()))?;
        Ok((grid, index.duration_ms))
    }

    /// Iterate over all frames in order.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over asset frames.
pub struct FrameIterator<'a> {
    player: &'a mut AssetPlayer,
    current: usize,
}

impl Iterator for FrameIterator<'_> {
    type Item = io::Result<(Grid<u16>, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }
        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.player.frame_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIterator<'_> {}
