//! Frame and palette types shared by every stage of the pipeline.

use std::time::Duration;

use image::RgbImage;

/// Display width in pixels.
pub const DISPLAY_WIDTH: usize = 64;

/// Display height in pixels.
pub const DISPLAY_HEIGHT: usize = 32;

/// Number of cells in one display frame.
pub const CELL_COUNT: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// Maximum number of palette entries for indexed frames.
pub const PALETTE_SIZE: usize = 16;

/// 24-bit RGB triple.
pub type Rgb = [u8; 3];

/// Frame construction errors.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame dimensions must be non-zero (got {width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("RGB buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("Grid holds {0} cells, expected 2048")]
    CellCount(usize),
    #[error("Palette holds {0} entries, at most 16 allowed")]
    PaletteSize(usize),
}

/// Decoded full-colour frame at source resolution.
#[derive(Debug, Clone)]
pub struct RawFrame {
    image: RgbImage,
}

impl RawFrame {
    /// Build from a flat, row-major RGB888 buffer.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyFrame { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let image = RgbImage::from_raw(width, height, data).ok_or(FrameError::BufferSize {
            expected,
            actual: 0,
        })?;
        Ok(Self { image })
    }

    /// Wrap an already decoded image.
    pub fn from_image(image: RgbImage) -> Result<Self, FrameError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyFrame { width, height });
        }
        Ok(Self { image })
    }

    /// Single-colour frame, mostly useful for tests and benches.
    pub fn solid(width: u32, height: u32, color: Rgb) -> Result<Self, FrameError> {
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::from_rgb(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Flat RGB888 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// Fixed 64x32 row-major grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Grid with every cell set to `value`.
    pub fn filled(value: T) -> Self {
        Self {
            cells: vec![value; CELL_COUNT],
        }
    }

    /// Take ownership of exactly [`CELL_COUNT`] cells.
    pub fn from_cells(cells: Vec<T>) -> Result<Self, FrameError> {
        if cells.len() != CELL_COUNT {
            return Err(FrameError::CellCount(cells.len()));
        }
        Ok(Self { cells })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[y * DISPLAY_WIDTH + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[y * DISPLAY_WIDTH + x] = value;
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Iterate over the 32 rows of 64 cells.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.cells.chunks_exact(DISPLAY_WIDTH)
    }
}

/// Display-resolution frame in one of the two native encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantizedFrame {
    /// 4-bit palette indices, paired with a [`Palette`].
    Indexed(Grid<u8>),
    /// RGB565 packed colours, expanded by identity.
    Packed(Grid<u16>),
}

impl QuantizedFrame {
    /// Resolve the colour of one cell.
    pub fn rgb_at(&self, x: usize, y: usize, colors: &ColorMap) -> Rgb {
        match (self, colors) {
            (QuantizedFrame::Indexed(grid), ColorMap::Palette(palette)) => {
                palette.color(grid.get(x, y))
            }
            (QuantizedFrame::Indexed(grid), ColorMap::Rgb565) => {
                let v = grid.get(x, y).wrapping_mul(17);
                [v, v, v]
            }
            (QuantizedFrame::Packed(grid), _) => super::expand_rgb565(grid.get(x, y)),
        }
    }
}

/// Ordered colour table for indexed frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Rgb>,
}

impl Palette {
    pub fn new(entries: Vec<Rgb>) -> Result<Self, FrameError> {
        if entries.len() > PALETTE_SIZE {
            return Err(FrameError::PaletteSize(entries.len()));
        }
        Ok(Self { entries })
    }

    /// Full 16-entry palette.
    pub fn from_array(entries: [Rgb; PALETTE_SIZE]) -> Self {
        Self {
            entries: entries.to_vec(),
        }
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    /// Colour for an index; out-of-range indices render black.
    #[inline]
    pub fn color(&self, index: u8) -> Rgb {
        self.entries
            .get(index as usize)
            .copied()
            .unwrap_or([0, 0, 0])
    }
}

/// How a sink turns cells into colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorMap {
    Palette(Palette),
    /// Identity expansion of packed RGB565 values.
    Rgb565,
}

/// A frame ready for presentation together with its display time.
#[derive(Debug, Clone)]
pub struct TimedFrame {
    pub frame: QuantizedFrame,
    pub colors: ColorMap,
    pub duration: Duration,
}

impl TimedFrame {
    /// Packed media frame shown for `duration_ms`.
    pub fn packed(grid: Grid<u16>, duration_ms: u32) -> Self {
        Self {
            frame: QuantizedFrame::Packed(grid),
            colors: ColorMap::Rgb565,
            duration: Duration::from_millis(duration_ms as u64),
        }
    }

    /// Palette-indexed frame shown for `duration`.
    pub fn indexed(grid: Grid<u8>, palette: Palette, duration: Duration) -> Self {
        Self {
            frame: QuantizedFrame::Indexed(grid),
            colors: ColorMap::Palette(palette),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_rejects_bad_buffer() {
        assert!(matches!(
            RawFrame::from_rgb(2, 2, vec![0; 11]),
            Err(FrameError::BufferSize {
                expected: 12,
                actual: 11
            })
        ));
        assert!(matches!(
            RawFrame::from_rgb(0, 4, vec![]),
            Err(FrameError::EmptyFrame { .. })
        ));
    }

    #[test]
    fn test_solid_frame() {
        let frame = RawFrame::solid(3, 2, [1, 2, 3]).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(&frame.as_bytes()[..6], &[1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_grid_cell_count() {
        assert!(Grid::from_cells(vec![0u16; CELL_COUNT - 1]).is_err());
        let mut grid = Grid::from_cells(vec![0u16; CELL_COUNT]).unwrap();
        grid.set(63, 31, 7);
        assert_eq!(grid.get(63, 31), 7);
        assert_eq!(grid.cells()[CELL_COUNT - 1], 7);
        assert_eq!(grid.rows().count(), DISPLAY_HEIGHT);
        assert!(grid.rows().all(|row| row.len() == DISPLAY_WIDTH));
    }

    #[test]
    fn test_palette_lookup() {
        let palette = Palette::new(vec![[255, 0, 0], [0, 0, 255]]).unwrap();
        assert_eq!(palette.color(1), [0, 0, 255]);
        assert_eq!(palette.color(9), [0, 0, 0]);
        assert_eq!(palette.color(0), [255, 0, 0]);
        assert!(Palette::new(vec![[0, 0, 0]; 17]).is_err());
    }

    #[test]
    fn test_rgb_at_resolves_both_encodings() {
        let palette = Palette::new(vec![[10, 20, 30]]).unwrap();
        let indexed = QuantizedFrame::Indexed(Grid::filled(0));
        assert_eq!(
            indexed.rgb_at(5, 5, &ColorMap::Palette(palette)),
            [10, 20, 30]
        );

        let packed = QuantizedFrame::Packed(Grid::filled(0xF800));
        assert_eq!(packed.rgb_at(0, 0, &ColorMap::Rgb565), [248, 0, 0]);
    }
}
