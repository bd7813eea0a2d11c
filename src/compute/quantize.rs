//! Reduction of decoded frames to the display grid and colour depth.

use image::RgbImage;
use image::imageops::{self, FilterType};

use super::frame::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Grid, RawFrame, Rgb};

/// Largest packed value ever emitted; 0xFFFF is reserved as a sentinel.
pub const MAX_PACKED_COLOR: u16 = 65534;

/// Pack an RGB888 triple as RGB565 (red in bits 15-11, green 10-5, blue 4-0).
#[inline]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let value = ((r as u16) >> 3) << 11 | ((g as u16) >> 2) << 5 | (b as u16) >> 3;
    value.min(MAX_PACKED_COLOR)
}

/// Expand an RGB565 value back to RGB888 by left-shifting each channel.
#[inline]
pub fn expand_rgb565(value: u16) -> Rgb {
    let r = ((value >> 11) & 0x1F) << 3;
    let g = ((value >> 5) & 0x3F) << 2;
    let b = (value & 0x1F) << 3;
    [r as u8, g as u8, b as u8]
}

/// Resizes raw frames to 64x32 and packs them as RGB565.
#[derive(Debug, Clone, Copy)]
pub struct FrameQuantizer {
    filter: FilterType,
}

impl Default for FrameQuantizer {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl FrameQuantizer {
    /// Quantizer using a specific resampling filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Resample to the display grid and pack every pixel.
    pub fn quantize(&self, raw: &RawFrame) -> Grid<u16> {
        let image = raw.image();
        let mut grid = Grid::filled(0);

        if image.dimensions() == (DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32) {
            pack_into(&mut grid, image);
        } else {
            let resized = imageops::resize(
                image,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
                self.filter,
            );
            pack_into(&mut grid, &resized);
        }

        grid
    }
}

/// Pack a display-sized image into `grid`, row-major.
fn pack_into(grid: &mut Grid<u16>, image: &RgbImage) {
    for (cell, p) in grid.cells_mut().iter_mut().zip(image.pixels()) {
        *cell = pack_rgb565(p[0], p[1], p[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::CELL_COUNT;
    use proptest::prelude::*;

    #[test]
    fn test_pack_primaries() {
        assert_eq!(pack_rgb565(255, 0, 0), 0xF800);
        assert_eq!(pack_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(pack_rgb565(0, 0, 255), 0x001F);
        assert_eq!(pack_rgb565(0, 0, 0), 0);
    }

    #[test]
    fn test_pack_clamps_white() {
        assert_eq!(pack_rgb565(255, 255, 255), MAX_PACKED_COLOR);
    }

    #[test]
    fn test_expand() {
        assert_eq!(expand_rgb565(0xF800), [248, 0, 0]);
        assert_eq!(expand_rgb565(0x07E0), [0, 252, 0]);
        assert_eq!(expand_rgb565(MAX_PACKED_COLOR), [248, 252, 240]);
    }

    #[test]
    fn test_quantize_identity_size() {
        let raw = RawFrame::solid(64, 32, [255, 0, 0]).unwrap();
        let grid = FrameQuantizer::default().quantize(&raw);
        assert!(grid.cells().iter().all(|&c| c == 0xF800));
    }

    #[test]
    fn test_quantize_keeps_row_major_order() {
        let mut image = RgbImage::from_pixel(64, 32, image::Rgb([0, 0, 255]));
        image.put_pixel(63, 0, image::Rgb([255, 0, 0]));
        image.put_pixel(0, 31, image::Rgb([0, 255, 0]));
        let raw = RawFrame::from_image(image).unwrap();

        let grid = FrameQuantizer::default().quantize(&raw);
        assert_eq!(grid.get(63, 0), 0xF800);
        assert_eq!(grid.get(0, 31), 0x07E0);
        assert_eq!(grid.get(1, 1), 0x001F);
    }

    #[test]
    fn test_quantize_upsample_solid() {
        let raw = RawFrame::solid(4, 2, [0, 255, 0]).unwrap();
        let grid = FrameQuantizer::default().quantize(&raw);
        assert_eq!(grid.cells().len(), CELL_COUNT);
        assert!(grid.cells().iter().all(|&c| c == 0x07E0));
    }

    proptest! {
        #[test]
        fn prop_quantize_always_fills_grid(width in 1u32..160, height in 1u32..96, shade in any::<u8>()) {
            let raw = RawFrame::solid(width, height, [shade, shade / 2, 255 - shade]).unwrap();
            let grid = FrameQuantizer::default().quantize(&raw);
            prop_assert_eq!(grid.rows().count(), DISPLAY_HEIGHT);
            for row in grid.rows() {
                prop_assert_eq!(row.len(), DISPLAY_WIDTH);
            }
        }

        #[test]
        fn prop_pack_is_stable_under_expansion(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let packed = pack_rgb565(r, g, b);
            prop_assert!(packed <= MAX_PACKED_COLOR);
            let [er, eg, eb] = expand_rgb565(packed);
            prop_assert_eq!(pack_rgb565(er, eg, eb), packed);
        }
    }
}
