/// Number of grid cells along each axis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub cols: u32,
    pub rows: u32,
}

impl Resolution {
    #[inline]
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Number of point primitives drawn per frame.
    #[inline]
    pub const fn vertices_count(self) -> u32 {
        self.cols * self.rows
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Maps a point index to its `(col, row)` cell.
    ///
    /// Returns `None` for indices outside `[0, vertices_count)`.
    #[inline]
    pub fn cell_of(self, index: u32) -> Option<(u32, u32)> {
        if index >= self.vertices_count() {
            return None;
        }
        Some((index % self.cols, index / self.cols))
    }

    /// Inverse of [`Resolution::cell_of`].
    #[inline]
    pub fn index_of(self, col: u32, row: u32) -> Option<u32> {
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }
}

/// Surface size in physical pixels; always `resolution * point_size`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Cells needed to cover a `surface_width` x `surface_height` surface.
///
/// Rounds up: a partial last column/row is still a cell and hangs off the
/// surface edge instead of leaving an uncovered strip.
///
/// `point_size` must be non-zero; zero is treated as one pixel.
pub fn derive_resolution(surface_width: u32, surface_height: u32, point_size: u32) -> Resolution {
    let p = point_size.max(1);
    Resolution::new(surface_width.div_ceil(p), surface_height.div_ceil(p))
}

/// Exact pixel size of a grid of `point_size` cells.
pub fn derive_dimension(resolution: Resolution, point_size: u32) -> Dimension {
    Dimension::new(
        resolution.cols.saturating_mul(point_size),
        resolution.rows.saturating_mul(point_size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_keeps_surface_size() {
        let res = derive_resolution(500, 500, 50);
        assert_eq!(res, Resolution::new(10, 10));
        assert_eq!(derive_dimension(res, 50), Dimension::new(500, 500));
        assert_eq!(res.vertices_count(), 100);
    }

    #[test]
    fn partial_cells_round_up() {
        let res = derive_resolution(510, 480, 50);
        assert_eq!(res, Resolution::new(11, 10));
        assert_eq!(derive_dimension(res, 50), Dimension::new(550, 500));
    }

    #[test]
    fn dimension_always_covers_surface() {
        for p in [1, 3, 7, 16, 50, 64] {
            for w in (0..300).step_by(13) {
                for h in (0..300).step_by(17) {
                    let res = derive_resolution(w, h, p);
                    let dim = derive_dimension(res, p);
                    assert_eq!(res.cols, w.div_ceil(p));
                    assert_eq!(res.rows, h.div_ceil(p));
                    assert!(dim.width >= w && dim.height >= h);
                    // Never a whole spare cell.
                    assert!(dim.width < w + p && dim.height < h + p);
                    assert_eq!(res.vertices_count(), res.cols * res.rows);
                }
            }
        }
    }

    #[test]
    fn zero_surface_is_empty() {
        let res = derive_resolution(0, 480, 50);
        assert!(res.is_empty());
        assert_eq!(res.vertices_count(), 0);
        assert!(derive_dimension(res, 50).is_empty());
    }

    #[test]
    fn zero_point_size_does_not_panic() {
        assert_eq!(derive_resolution(10, 4, 0), Resolution::new(10, 4));
    }

    #[test]
    fn index_mapping_is_row_major_bijection() {
        let res = Resolution::new(11, 10);
        let mut seen = vec![false; res.vertices_count() as usize];
        for i in 0..res.vertices_count() {
            let (col, row) = res.cell_of(i).unwrap();
            assert_eq!(col, i % 11);
            assert_eq!(row, i / 11);
            assert_eq!(res.index_of(col, row), Some(i));
            let slot = &mut seen[(row * 11 + col) as usize];
            assert!(!*slot);
            *slot = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(res.cell_of(110), None);
        assert_eq!(res.index_of(11, 0), None);
    }
}
