//! Compute module - Frame model, quantization and procedural synthesis.

mod effects;
mod frame;
mod generator;
mod palette;
mod quantize;

pub use effects::*;
pub use frame::*;
pub use generator::*;
pub use palette::*;
pub use quantize::*;
