//! Color model for the grid.
//!
//! - `Color`: straight-alpha sRGB color as authored in configuration
//! - `Palette`: the two fill colors a cell can take

pub mod color;
pub mod palette;

pub use color::Color;
pub use palette::Palette;
