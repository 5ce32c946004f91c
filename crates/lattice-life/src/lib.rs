//! Conway's Game of Life on a bounded board.
//!
//! Cells are stored row-major (`index = row * cols + column`), the same
//! order the grid renderer lays points out in. The board does not wrap:
//! cells past an edge count as dead.

/// One cell. The discriminant is the value handed to the renderer.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Dead = 0,
    Alive = 1,
}

impl Cell {
    pub fn toggle(&mut self) {
        *self = match *self {
            Cell::Dead => Cell::Alive,
            Cell::Alive => Cell::Dead,
        };
    }

    #[inline]
    pub fn is_alive(self) -> bool {
        self == Cell::Alive
    }

    /// Per-cell state value: `1.0` alive, `0.0` dead.
    #[inline]
    pub fn state_value(self) -> f32 {
        self as u8 as f32
    }
}

/// Position of a cell on the board.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub row: usize,
    pub column: usize,
}

impl Coordinates {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Offsets of the 8-neighbourhood as (row, column) deltas.
const NEIGHBOURHOOD: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    /// Next generation; swapped with `cells` after every step.
    scratch: Vec<Cell>,
}

impl Board {
    /// Creates a `rows` x `cols` board with every even-indexed cell alive.
    pub fn new(rows: usize, cols: usize) -> Self {
        let len = rows.saturating_mul(cols);
        let cells = (0..len)
            .map(|i| if i % 2 == 0 { Cell::Alive } else { Cell::Dead })
            .collect();
        Self {
            rows,
            cols,
            cells,
            scratch: vec![Cell::Dead; len],
        }
    }

    /// Creates a board from explicit cells. Returns `None` if `cells` does
    /// not hold exactly `rows * cols` entries.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Option<Self> {
        if rows.checked_mul(cols)? != cells.len() {
            return None;
        }
        let scratch = vec![Cell::Dead; cells.len()];
        Some(Self { rows, cols, cells, scratch })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, at: Coordinates) -> Option<Cell> {
        self.index_of(at).map(|i| self.cells[i])
    }

    pub fn position_of(&self, index: usize) -> Option<Coordinates> {
        if index >= self.len() {
            return None;
        }
        Some(Coordinates::new(index / self.cols, index % self.cols))
    }

    pub fn index_of(&self, at: Coordinates) -> Option<usize> {
        (at.row < self.rows && at.column < self.cols).then(|| at.row * self.cols + at.column)
    }

    /// Live cells among the up to 8 neighbours of `index`.
    pub fn live_neighbours(&self, index: usize) -> usize {
        let Some(at) = self.position_of(index) else { return 0 };
        NEIGHBOURHOOD
            .iter()
            .filter_map(|&(dr, dc)| {
                let row = at.row.checked_add_signed(dr)?;
                let column = at.column.checked_add_signed(dc)?;
                self.cell(Coordinates::new(row, column))
            })
            .filter(|c| c.is_alive())
            .count()
    }

    /// Advances one generation (B3/S23).
    pub fn step(&mut self) {
        for i in 0..self.cells.len() {
            let n = self.live_neighbours(i);
            self.scratch[i] = match (self.cells[i], n) {
                (Cell::Alive, 2 | 3) => Cell::Alive,
                (Cell::Dead, 3) => Cell::Alive,
                _ => Cell::Dead,
            };
        }
        std::mem::swap(&mut self.cells, &mut self.scratch);
    }

    /// Writes one float per cell into `out`, replacing its contents.
    pub fn write_state(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.cells.iter().map(|c| c.state_value()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Cell::{Alive as A, Dead as D};

    fn board(rows: usize, cols: usize, cells: &[Cell]) -> Board {
        Board::from_cells(rows, cols, cells.to_vec()).unwrap()
    }

    #[test]
    fn new_board_seeds_even_indices() {
        let b = Board::new(3, 3);
        assert_eq!(b.len(), 9);
        for (i, c) in b.cells().iter().enumerate() {
            assert_eq!(c.is_alive(), i % 2 == 0, "cell {i}");
        }
    }

    #[test]
    fn cell_toggle_and_value() {
        let mut c = Cell::Dead;
        assert_eq!(c.state_value(), 0.0);
        c.toggle();
        assert!(c.is_alive());
        assert_eq!(c.state_value(), 1.0);
    }

    #[test]
    fn position_and_index_round_trip() {
        let b = Board::new(4, 7);
        assert_eq!(b.position_of(9), Some(Coordinates::new(1, 2)));
        assert_eq!(b.index_of(Coordinates::new(1, 2)), Some(9));
        assert_eq!(b.position_of(28), None);
        assert_eq!(b.index_of(Coordinates::new(0, 7)), None);
    }

    #[test]
    fn corner_has_three_neighbours_at_most() {
        let b = board(2, 2, &[D, A, A, A]);
        assert_eq!(b.live_neighbours(0), 3);
        // No wrapping: the opposite edge is not adjacent.
        let b = board(1, 3, &[A, D, A]);
        assert_eq!(b.live_neighbours(0), 0);
        assert_eq!(b.live_neighbours(1), 2);
    }

    #[test]
    fn blinker_oscillates() {
        #[rustfmt::skip]
        let horizontal = [
            D, D, D,
            A, A, A,
            D, D, D,
        ];
        #[rustfmt::skip]
        let vertical = [
            D, A, D,
            D, A, D,
            D, A, D,
        ];
        let mut b = board(3, 3, &horizontal);
        b.step();
        assert_eq!(b.cells(), &vertical);
        b.step();
        assert_eq!(b.cells(), &horizontal);
    }

    #[test]
    fn block_is_stable() {
        #[rustfmt::skip]
        let block = [
            D, D, D, D,
            D, A, A, D,
            D, A, A, D,
            D, D, D, D,
        ];
        let mut b = board(4, 4, &block);
        b.step();
        assert_eq!(b.cells(), &block);
    }

    #[test]
    fn lonely_cell_dies() {
        let mut b = board(3, 3, &[D, D, D, D, A, D, D, D, D]);
        b.step();
        assert!(b.cells().iter().all(|c| !c.is_alive()));
    }

    #[test]
    fn write_state_replaces_buffer() {
        let b = board(1, 3, &[A, D, A]);
        let mut out = vec![9.0; 10];
        b.write_state(&mut out);
        assert_eq!(out, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_board_is_inert() {
        let mut b = Board::new(0, 5);
        assert!(b.is_empty());
        b.step();
        let mut out = Vec::new();
        b.write_state(&mut out);
        assert!(out.is_empty());
        assert_eq!(b.live_neighbours(0), 0);
    }

    #[test]
    fn from_cells_rejects_wrong_length() {
        assert!(Board::from_cells(2, 2, vec![D; 3]).is_none());
    }
}
