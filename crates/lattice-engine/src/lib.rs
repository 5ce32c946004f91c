//! Lattice engine crate.
//!
//! Owns the platform + GPU runtime and the cell-grid renderer that draws
//! automaton state as a raster of square points.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
