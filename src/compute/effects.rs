//! Scalar colour-field effects.
//!
//! Each effect evaluates a scalar field `v(x, y, t)` and maps it to a 4-bit
//! palette index with `floor((v + offset) * scale) mod 16`.

use super::frame::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Grid, PALETTE_SIZE};

/// Centre used by the radial effects.
pub const CENTER: (f32, f32) = (32.0, 16.0);

/// The three procedural effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Plasma,
    Spiral,
    Ripple,
}

impl Effect {
    /// Raw scalar field at a pixel.
    pub fn field(self, x: usize, y: usize, t: f32) -> f32 {
        let (xf, yf) = (x as f32, y as f32);
        match self {
            Effect::Plasma => {
                (xf * 0.1 + t * 0.1).sin()
                    + (yf * 0.11 + t * 0.11).sin()
                    + ((xf + yf) * 0.1 + t * 0.13).sin()
                    + (((xf * xf + yf * yf) * 0.1).sqrt() + t * 0.07).sin()
            }
            Effect::Spiral => {
                let (dx, dy) = (xf - CENTER.0, yf - CENTER.1);
                let angle = dy.atan2(dx);
                let dist = (dx * dx + dy * dy).sqrt();
                (dist * 0.3 - t * 0.1 + angle * 3.0).sin()
            }
            Effect::Ripple => {
                let (dx, dy) = (xf - CENTER.0, yf - CENTER.1);
                let dist = (dx * dx + dy * dy).sqrt();
                (dist * 0.5 - t * 0.1).sin() + (dist * 0.33 - t * 0.15).sin()
            }
        }
    }

    /// `(offset, scale)` lifting the field into [0, 16).
    pub fn mapping(self) -> (f32, f32) {
        match self {
            Effect::Plasma => (4.0, 2.0),
            Effect::Spiral => (1.0, 8.0),
            Effect::Ripple => (2.0, 4.0),
        }
    }

    /// Palette index at a pixel.
    #[inline]
    pub fn index(self, x: usize, y: usize, t: u32) -> u8 {
        let (offset, scale) = self.mapping();
        let v = self.field(x, y, t as f32);
        (((v + offset) * scale).floor() as i32).rem_euclid(PALETTE_SIZE as i32) as u8
    }

    /// Render the whole display into `grid`.
    pub fn render_into(self, t: u32, grid: &mut Grid<u8>) {
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                grid.set(x, y, self.index(x, y, t));
            }
        }
    }

    pub fn render(self, t: u32) -> Grid<u8> {
        let mut grid = Grid::filled(0);
        self.render_into(t, &mut grid);
        grid
    }
}
