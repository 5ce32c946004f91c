//! Grid geometry shared by the renderer and its callers.
//!
//! Canonical space:
//! - surface units are physical pixels
//! - cells are addressed row-major, `index = row * cols + col`
//! - row 0 sits at the bottom of the surface (clip space +Y is up)

mod grid;

pub use grid::{derive_dimension, derive_resolution, Dimension, Resolution};
