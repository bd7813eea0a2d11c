//! Procedural effect generator with timed cross-fades.
//!
//! One cycle lasts [`CYCLE_FRAMES`] frames and is partitioned into phases:
//!
//! ```text
//! phi in [0.00, 0.33)  plasma
//! phi in [0.33, 0.40)  plasma -> spiral cross-fade
//! phi in [0.40, 0.66)  spiral
//! phi in [0.66, 0.73)  spiral -> ripple cross-fade
//! phi in [0.73, 1.00)  ripple
//! ```
//!
//! During a cross-fade each pixel independently takes the incoming effect
//! with probability `(phi - start) * 7.5`.

use rand::prelude::*;

use super::effects::Effect;
use super::frame::{Grid, Palette};
use super::palette::rainbow_palette;

/// Frames per effect cycle (about 24 s at 30 fps).
pub const CYCLE_FRAMES: u32 = 720;

/// Slope of the cross-fade probability ramp.
pub const BLEND_RATE: f32 = 7.5;

const PLASMA_END: f32 = 0.33;
const FIRST_FADE_END: f32 = 0.40;
const SPIRAL_END: f32 = 0.66;
const SECOND_FADE_END: f32 = 0.73;

/// Which effect(s) a frame draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Single(Effect),
    Blend {
        from: Effect,
        to: Effect,
        /// Per-pixel probability of taking `to`.
        probability: f32,
    },
}

/// Cycle position in [0, 1) for frame counter `t`.
#[inline]
pub fn cycle_phase(t: u32) -> f32 {
    (t % CYCLE_FRAMES) as f32 / CYCLE_FRAMES as f32
}

/// Effect selection for frame counter `t`.
pub fn select(t: u32) -> Selection {
    let phi = cycle_phase(t);
    if phi < PLASMA_END {
        Selection::Single(Effect::Plasma)
    } else if phi < FIRST_FADE_END {
        Selection::Blend {
            from: Effect::Plasma,
            to: Effect::Spiral,
            probability: (phi - PLASMA_END) * BLEND_RATE,
        }
    } else if phi < SPIRAL_END {
        Selection::Single(Effect::Spiral)
    } else if phi < SECOND_FADE_END {
        Selection::Blend {
            from: Effect::Spiral,
            to: Effect::Ripple,
            probability: (phi - SPIRAL_END) * BLEND_RATE,
        }
    } else {
        Selection::Single(Effect::Ripple)
    }
}

/// Renders palette-indexed frames from the frame counter.
pub struct EffectGenerator {
    rng: StdRng,
    /// Scratch grid for the incoming effect during cross-fades.
    incoming: Grid<u8>,
}

impl EffectGenerator {
    /// Create from seed; the seed only affects cross-fade dithering.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            incoming: Grid::filled(0),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            incoming: Grid::filled(0),
        }
    }

    /// Render frame `t` into a fresh grid, returning it with its palette.
    pub fn render(&mut self, t: u32) -> (Grid<u8>, Palette) {
        let mut grid = Grid::filled(0);
        let palette = self.render_into(t, &mut grid);
        (grid, palette)
    }

    /// Render frame `t` into `grid` and return the matching palette.
    pub fn render_into(&mut self, t: u32, grid: &mut Grid<u8>) -> Palette {
        match select(t) {
            Selection::Single(effect) => effect.render_into(t, grid),
            Selection::Blend {
                from,
                to,
                probability,
            } => {
                from.render_into(t, grid);
                to.render_into(t, &mut self.incoming);
                for (cell, &incoming) in grid.cells_mut().iter_mut().zip(self.incoming.cells()) {
                    if self.rng.r#gen::<f32>() < probability {
                        *cell = incoming;
                    }
                }
            }
        }
        rainbow_palette(t)
    }
}
