use std::num::NonZeroU64;
use std::time::Duration;

use super::FrameTime;

/// Default simulation cadence: one step per 100 refresh ticks of a 60 Hz
/// display, expressed as wall-clock time.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_nanos(1_666_666_667);

/// When the simulation is allowed to advance.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepSchedule {
    /// Every tick whose frame index is a multiple of `n`. Speed follows the
    /// display refresh rate.
    EveryNthFrame(NonZeroU64),

    /// Once per interval of accumulated frame time, independent of the
    /// refresh rate. At most one step per tick.
    FixedInterval(Duration),
}

impl Default for StepSchedule {
    fn default() -> Self {
        StepSchedule::FixedInterval(DEFAULT_STEP_INTERVAL)
    }
}

/// Gates simulation steps on refresh ticks according to a [`StepSchedule`].
///
/// The first tick always steps so the initial state is shown immediately.
#[derive(Debug, Clone)]
pub struct StepThrottle {
    schedule: StepSchedule,
    /// Time owed to the fixed-interval schedule; `None` until the first tick.
    accumulated: Option<Duration>,
}

impl StepThrottle {
    pub fn new(schedule: StepSchedule) -> Self {
        Self { schedule, accumulated: None }
    }

    pub fn schedule(&self) -> StepSchedule {
        self.schedule
    }

    /// Restarts the schedule; the next tick steps.
    pub fn reset(&mut self) {
        self.accumulated = None;
    }

    /// Returns `true` if the simulation should advance on this tick.
    pub fn should_step(&mut self, time: &FrameTime) -> bool {
        match self.schedule {
            StepSchedule::EveryNthFrame(n) => {
                let first = self.accumulated.replace(Duration::ZERO).is_none();
                first || time.frame_index % n.get() == 0
            }
            StepSchedule::FixedInterval(interval) => {
                let Some(owed) = self.accumulated.as_mut() else {
                    self.accumulated = Some(Duration::ZERO);
                    return true;
                };

                *owed += Duration::from_secs_f32(time.dt.max(0.0));
                if *owed < interval {
                    return false;
                }

                // Keep the remainder so steps do not drift, but never carry
                // more than one interval: a long stall must not cause a burst.
                *owed = (*owed - interval).min(interval);
                true
            }
        }
    }
}

impl Default for StepThrottle {
    fn default() -> Self {
        Self::new(StepSchedule::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn tick(frame_index: u64, dt: f32) -> FrameTime {
        FrameTime { dt, now: Instant::now(), frame_index }
    }

    fn nth(n: u64) -> StepThrottle {
        StepThrottle::new(StepSchedule::EveryNthFrame(NonZeroU64::new(n).unwrap()))
    }

    #[test]
    fn every_nth_frame_matches_modulo() {
        let mut t = nth(100);
        let fired: Vec<u64> = (0..350).filter(|&i| t.should_step(&tick(i, 0.016))).collect();
        assert_eq!(fired, vec![0, 100, 200, 300]);
    }

    #[test]
    fn every_nth_frame_first_tick_steps_even_off_cycle() {
        let mut t = nth(10);
        assert!(t.should_step(&tick(7, 0.016)));
        assert!(!t.should_step(&tick(8, 0.016)));
        assert!(t.should_step(&tick(10, 0.016)));
    }

    #[test]
    fn fixed_interval_is_refresh_rate_independent() {
        let interval = Duration::from_millis(100);
        for hz in [30.0f32, 60.0, 144.0] {
            let mut t = StepThrottle::new(StepSchedule::FixedInterval(interval));
            let ticks = (hz * 2.0) as u64; // two seconds
            let steps = (0..ticks).filter(|&i| t.should_step(&tick(i, 1.0 / hz))).count();
            // First tick plus ~20 interval steps.
            assert!((20..=22).contains(&steps), "{hz} Hz gave {steps} steps");
        }
    }

    #[test]
    fn fixed_interval_first_tick_steps() {
        let mut t = StepThrottle::new(StepSchedule::FixedInterval(Duration::from_secs(10)));
        assert!(t.should_step(&tick(0, 0.016)));
        assert!(!t.should_step(&tick(1, 0.016)));
    }

    #[test]
    fn stall_does_not_burst() {
        let mut t = StepThrottle::new(StepSchedule::FixedInterval(Duration::from_millis(100)));
        assert!(t.should_step(&tick(0, 0.0)));
        // A long stall is one step, then at most one more for the carried
        // remainder, not ten.
        assert!(t.should_step(&tick(1, 1.0)));
        assert!(t.should_step(&tick(2, 0.0)));
        assert!(!t.should_step(&tick(3, 0.0)));
    }

    #[test]
    fn reset_makes_next_tick_step() {
        let mut t = StepThrottle::default();
        assert!(t.should_step(&tick(0, 0.016)));
        assert!(!t.should_step(&tick(1, 0.016)));
        t.reset();
        assert!(t.should_step(&tick(2, 0.016)));
    }
}
