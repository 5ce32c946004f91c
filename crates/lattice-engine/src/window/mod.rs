//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, acquires the rendering context
//! for it, and drives the application once per display refresh.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
