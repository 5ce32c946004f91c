use super::Color;

/// The two fill colors of the grid.
///
/// `on` is used for cells whose state is exactly `1.0`; every other value,
/// including NaN and values near `1.0`, selects `off`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Palette {
    pub on: Color,
    pub off: Color,
}

impl Palette {
    pub const fn new(on: Color, off: Color) -> Self {
        Self { on, off }
    }

    /// CPU reference of the fragment stage's color choice.
    #[inline]
    pub fn select(&self, state: f32) -> Color {
        if state == 1.0 { self.on } else { self.off }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(Color::RED, Color::BLUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_selects_on() {
        assert_eq!(Palette::default().select(1.0), Color::RED);
    }

    #[test]
    fn everything_else_selects_off() {
        let p = Palette::default();
        for state in [0.0, 0.5, -1.0, 2.0, 1.0 + f32::EPSILON, 1.0 - f32::EPSILON / 2.0, f32::NAN] {
            assert_eq!(p.select(state), Color::BLUE, "state {state}");
        }
    }
}
