use winit::dpi::PhysicalSize;

use crate::coords::{derive_dimension, derive_resolution, Dimension, Resolution};

/// Grid geometry derived from one surface measurement.
///
/// Built only through [`GridLayout::derive`], so `dimension` is always
/// `resolution * point_size`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub resolution: Resolution,
    pub dimension: Dimension,
    pub point_size: u32,
}

impl GridLayout {
    pub fn derive(surface_width: u32, surface_height: u32, point_size: u32) -> Self {
        let resolution = derive_resolution(surface_width, surface_height, point_size);
        Self {
            resolution,
            dimension: derive_dimension(resolution, point_size),
            point_size,
        }
    }

    pub fn for_surface(surface: PhysicalSize<u32>, point_size: u32) -> Self {
        Self::derive(surface.width, surface.height, point_size)
    }

    #[inline]
    pub fn vertices_count(&self) -> u32 {
        self.resolution.vertices_count()
    }

    /// Backing size the surface must be configured to.
    #[inline]
    pub fn surface_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.dimension.width, self.dimension.height)
    }

    /// Clip-space center of point `index`, mirroring the vertex stage.
    pub fn cell_center_ndc(&self, index: u32) -> Option<[f32; 2]> {
        let (col, row) = self.resolution.cell_of(index)?;
        let p = self.point_size as f32;
        let x = (col as f32 * p + p / 2.0) / self.dimension.width as f32;
        let y = (row as f32 * p + p / 2.0) / self.dimension.height as f32;
        Some([x * 2.0 - 1.0, y * 2.0 - 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6
    }

    #[test]
    fn derive_matches_surface_example() {
        let l = GridLayout::derive(510, 480, 50);
        assert_eq!(l.resolution, Resolution::new(11, 10));
        assert_eq!(l.dimension, Dimension::new(550, 500));
        assert_eq!(l.surface_size(), PhysicalSize::new(550, 500));
        assert_eq!(l.vertices_count(), 110);
    }

    #[test]
    fn first_and_last_cells_are_centered_in_corners() {
        let l = GridLayout::derive(500, 500, 50);
        assert!(approx(l.cell_center_ndc(0).unwrap(), [-0.9, -0.9]));
        assert!(approx(l.cell_center_ndc(99).unwrap(), [0.9, 0.9]));
        // Index 1 is the next column of row 0.
        assert!(approx(l.cell_center_ndc(1).unwrap(), [-0.7, -0.9]));
        // Index 10 starts row 1.
        assert!(approx(l.cell_center_ndc(10).unwrap(), [-0.9, -0.7]));
        assert_eq!(l.cell_center_ndc(100), None);
    }

    #[test]
    fn centers_stay_inside_clip_space() {
        let l = GridLayout::derive(333, 271, 16);
        for i in 0..l.vertices_count() {
            let [x, y] = l.cell_center_ndc(i).unwrap();
            assert!(x > -1.0 && x < 1.0 && y > -1.0 && y < 1.0);
        }
    }

    #[test]
    fn adjacent_centers_are_one_point_apart() {
        let l = GridLayout::derive(400, 300, 20);
        let a = l.cell_center_ndc(0).unwrap();
        let b = l.cell_center_ndc(1).unwrap();
        // One point in NDC is 2 * point_size / width.
        assert!(((b[0] - a[0]) - 2.0 * 20.0 / 400.0).abs() < 1e-6);
    }
}
