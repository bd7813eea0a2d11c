//! Schema module - Configuration types for the display pipeline.

mod config;

pub use config::*;
