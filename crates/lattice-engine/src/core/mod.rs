//! Core engine-facing contracts.
//!
//! The interface between the runtime (platform loop) and the application
//! that drives the grid: one callback per window event, one per frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
