//! Binary format definitions for compiled matrix assets.

use std::io::{self, Read, Write};

use crate::compute::CELL_COUNT;

/// Magic bytes identifying a compiled asset.
pub const ASSET_MAGIC: &[u8; 4] = b"MXRL";

/// Current format version.
pub const ASSET_VERSION: u16 = 1;

/// Size of one uncompressed frame payload in bytes.
pub const FRAME_BYTES: usize = CELL_COUNT * 2;

/// Compression type for frame payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Raw little-endian u16 cells.
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Asset header flags. Compression lives in the low nibble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetFlags {
    pub compression: CompressionType,
}

impl AssetFlags {
    pub fn to_u16(self) -> u16 {
        self.compression as u16
    }

    pub fn from_u16(v: u16) -> io::Result<Self> {
        let nibble = (v & 0x0F) as u8;
        let compression = CompressionType::from_u8(nibble).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown compression type: {nibble}"),
            )
        })?;
        Ok(Self { compression })
    }
}

/// File header for compiled assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHeader {
    pub width: u16,
    pub height: u16,
    pub frame_count: u32,
    pub flags: AssetFlags,
}

impl AssetHeader {
    /// Magic(4) + Version(2) + Flags(2) + Width(2) + Height(2) +
    /// FrameCount(4) + Reserved(16) = 32
    pub const SIZE: usize = 32;

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ASSET_MAGIC)?;
        w.write_all(&ASSET_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != ASSET_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid MXRL magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != ASSET_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported MXRL version: {version}"),
            ));
        }

        r.read_exact(&mut buf2)?;
        let flags = AssetFlags::from_u16(u16::from_le_bytes(buf2))?;

        r.read_exact(&mut buf2)?;
        let width = u16::from_le_bytes(buf2);

        r.read_exact(&mut buf2)?;
        let height = u16::from_le_bytes(buf2);

        r.read_exact(&mut buf4)?;
        let frame_count = u32::from_le_bytes(buf4);

        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            width,
            height,
            frame_count,
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Stored payload size in bytes.
    pub size: u32,
    /// Display time of the frame.
    pub duration_ms: u32,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        w.write_all(&self.duration_ms.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf4)?;
        let size = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let duration_ms = u32::from_le_bytes(buf4);

        Ok(Self {
            offset,
            size,
            duration_ms,
        })
    }
}

/// Encode packed cells as little-endian bytes.
pub fn encode_frame(cells: &[u16], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(cells.len() * 2);
    for &v in cells {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Decode little-endian bytes into packed cells.
pub fn decode_frame(bytes: &[u8]) -> io::Result<Vec<u16>> {
    if bytes.len() != FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame size mismatch: {} bytes, expected {}",
                bytes.len(),
                FRAME_BYTES
            ),
        ));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Fallback when LZ4 is not available.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let header = AssetHeader {
            width: 64,
            height: 32,
            frame_count: 12,
            flags: AssetFlags {
                compression: CompressionType::Lz4,
            },
        };

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), AssetHeader::SIZE);
        assert_eq!(&buf[..4], b"MXRL");
        assert_eq!(&buf[8..10], &64u16.to_le_bytes());
        assert_eq!(&buf[12..16], &12u32.to_le_bytes());

        let decoded = AssetHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut buf = vec![0u8; AssetHeader::SIZE];
        buf[..4].copy_from_slice(b"FLWA");
        let err = AssetHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_unknown_compression_rejected() {
        assert!(AssetFlags::from_u16(0x0007).is_err());
    }

    #[test]
    fn test_frame_payload_is_little_endian() {
        let mut cells = vec![0u16; CELL_COUNT];
        cells[0] = 0xF800;
        cells[CELL_COUNT - 1] = 0x001F;

        let mut bytes = Vec::new();
        encode_frame(&cells, &mut bytes);
        assert_eq!(bytes.len(), FRAME_BYTES);
        assert_eq!(&bytes[..2], &[0x00, 0xF8]);

        assert_eq!(decode_frame(&bytes).unwrap(), cells);
        assert!(decode_frame(&bytes[1..]).is_err());
    }
}
