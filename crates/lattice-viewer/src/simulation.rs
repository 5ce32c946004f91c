use lattice_life::Board;

/// An automaton the viewer can drive.
///
/// The viewer creates one per grid resolution and rebuilds it whenever the
/// window is resized to a different number of cells.
pub trait Simulation {
    /// Creates a simulation covering `rows` x `cols` cells.
    fn new(rows: usize, cols: usize) -> Self
    where
        Self: Sized;

    /// Floats written per cell by [`Simulation::write_state`], 1..=4.
    fn components(&self) -> u32 {
        1
    }

    /// Advances one generation.
    fn advance(&mut self);

    /// Writes the per-cell state row-major into `out`, replacing its contents.
    fn write_state(&self, out: &mut Vec<f32>);
}

impl Simulation for Board {
    fn new(rows: usize, cols: usize) -> Self {
        Board::new(rows, cols)
    }

    fn advance(&mut self) {
        self.step();
    }

    fn write_state(&self, out: &mut Vec<f32>) {
        Board::write_state(self, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<S: Simulation>(rows: usize, cols: usize) -> Vec<f32> {
        let mut sim = S::new(rows, cols);
        let mut out = Vec::new();
        sim.write_state(&mut out);
        assert_eq!(out.len(), rows * cols * sim.components() as usize);
        sim.advance();
        sim.write_state(&mut out);
        out
    }

    #[test]
    fn board_state_matches_grid_size() {
        let out = run::<Board>(10, 11);
        assert_eq!(out.len(), 110);
        assert!(out.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn board_advance_steps_once() {
        let mut sim = <Board as Simulation>::new(4, 4);
        let mut expected = Board::new(4, 4);
        expected.step();
        sim.advance();
        assert_eq!(sim.cells(), expected.cells());
    }
}
