use std::time::Duration;

use anyhow::Result;

use lattice_engine::logging::{init_logging, LoggingConfig};
use lattice_engine::paint::{Color, Palette};
use lattice_engine::time::StepSchedule;
use lattice_life::Board;

mod simulation;
mod viewer;

use viewer::Viewer;

/// Cell edge length in physical pixels.
const POINT_SIZE_VAR: &str = "LATTICE_POINT_SIZE";
/// Milliseconds between simulation steps.
const STEP_MS_VAR: &str = "LATTICE_STEP_MS";
/// Hex colors (`#rrggbb` or `#rrggbbaa`) of live and dead cells.
const ON_COLOR_VAR: &str = "LATTICE_ON_COLOR";
const OFF_COLOR_VAR: &str = "LATTICE_OFF_COLOR";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut viewer = Viewer::new().title("lattice · life");

    if let Some(raw) = env_var(POINT_SIZE_VAR) {
        match parse_point_size(&raw) {
            Some(px) => viewer = viewer.point_size(px),
            None => log::warn!("ignoring {POINT_SIZE_VAR}={raw:?}: expected a positive integer"),
        }
    }
    if let Some(raw) = env_var(STEP_MS_VAR) {
        match parse_step_interval(&raw) {
            Some(interval) => viewer = viewer.schedule(StepSchedule::FixedInterval(interval)),
            None => log::warn!("ignoring {STEP_MS_VAR}={raw:?}: expected a positive integer"),
        }
    }

    let defaults = Palette::default();
    let on = color_override(ON_COLOR_VAR).unwrap_or(defaults.on);
    let off = color_override(OFF_COLOR_VAR).unwrap_or(defaults.off);
    viewer = viewer.palette(Palette::new(on, off));

    viewer.run::<Board>()
}

fn color_override(name: &str) -> Option<Color> {
    let raw = env_var(name)?;
    let color = Color::from_hex(raw.trim());
    if color.is_none() {
        log::warn!("ignoring {name}={raw:?}: expected #rrggbb or #rrggbbaa");
    }
    color
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_point_size(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|&px| px > 0)
}

fn parse_step_interval(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_size_must_be_positive() {
        assert_eq!(parse_point_size("50"), Some(50));
        assert_eq!(parse_point_size(" 12 "), Some(12));
        assert_eq!(parse_point_size("0"), None);
        assert_eq!(parse_point_size("-3"), None);
        assert_eq!(parse_point_size("big"), None);
    }

    #[test]
    fn step_interval_is_in_milliseconds() {
        assert_eq!(parse_step_interval("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_step_interval("0"), None);
        assert_eq!(parse_step_interval("1.5"), None);
    }

    #[test]
    fn unset_color_keeps_default() {
        assert_eq!(color_override("LATTICE_TEST_UNSET_COLOR"), None);
    }
}
