//! Palette synthesis for procedural effects.

use super::frame::{PALETTE_SIZE, Palette, Rgb};

/// Hue spacing between consecutive palette entries, in degrees.
pub const HUE_STEP: f32 = 22.5;

/// Amplitude of the slow hue drift, in degrees.
pub const DRIFT_AMPLITUDE: f32 = 30.0;

/// Convert HSV to RGB888.
///
/// `hue` is in degrees (any value, wrapped into [0, 360)), `saturation` and
/// `value` are in [0, 1]. Channels are truncated, not rounded.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb {
    let h = hue.rem_euclid(360.0) / 360.0;
    let sector = (h * 6.0).floor();
    let frac = h * 6.0 - sector;

    let p = value * (1.0 - saturation);
    let q = value * (1.0 - frac * saturation);
    let t = value * (1.0 - (1.0 - frac) * saturation);

    let (r, g, b) = match (sector as i32).rem_euclid(6) {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };

    [
        (r * 255.0) as u8,
        (g * 255.0) as u8,
        (b * 255.0) as u8,
    ]
}

/// Hue of palette entry `index` at frame counter `t`, in degrees.
#[inline]
pub fn entry_hue(t: u32, index: usize) -> f32 {
    let t = t as f32;
    let drift = (t * 0.02).sin() * DRIFT_AMPLITUDE;
    (t + index as f32 * HUE_STEP + drift).rem_euclid(360.0)
}

/// Build the 16-entry rotating rainbow palette for frame counter `t`.
pub fn rainbow_palette(t: u32) -> Palette {
    let mut entries = [[0u8; 3]; PALETTE_SIZE];
    for (i, entry) in entries.iter_mut().enumerate() {
        *entry = hsv_to_rgb(entry_hue(t, i), 1.0, 1.0);
    }
    Palette::from_array(entries)
}
