//! Frame timing and simulation pacing.
//!
//! - `FrameClock`: one per window, `tick()` once per presented frame
//! - `StepThrottle`: decides on which ticks the simulation advances

mod frame_clock;
mod step;

pub use frame_clock::{FrameClock, FrameTime};
pub use step::{StepSchedule, StepThrottle, DEFAULT_STEP_INTERVAL};
