use std::ops::Range;

use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

use super::layout::GridLayout;
use super::shader::Program;
use super::uniforms::UniformBinding;

/// Corner vertices emitted per point instance (two triangles).
const CORNERS_PER_POINT: u32 = 6;

/// Smallest state buffer allocation, in bytes.
const MIN_STATE_CAPACITY: u64 = 256;

/// Number of points a state buffer of `len` floats describes.
///
/// A trailing partial point is dropped; zero components describe nothing.
#[inline]
pub fn draw_count(len: usize, components: u32) -> u32 {
    if components == 0 {
        return 0;
    }
    u32::try_from(len / components as usize).unwrap_or(u32::MAX)
}

/// The commands one frame records after clearing the target.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPlan {
    /// `x, y, width, height` in surface pixels.
    pub viewport: [f32; 4],
    /// Bytes of the state buffer bound for the draw.
    pub state_bytes: u64,
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

/// Plans the draw of `points` cells of `components` floats each.
///
/// `None` means the frame is the clear alone.
pub fn plan_draw(points: u32, components: u32, layout: &GridLayout) -> Option<DrawPlan> {
    if points == 0 || components == 0 || layout.dimension.is_empty() {
        return None;
    }
    Some(DrawPlan {
        viewport: [
            0.0,
            0.0,
            layout.dimension.width as f32,
            layout.dimension.height as f32,
        ],
        state_bytes: points as u64 * components as u64 * 4,
        vertices: 0..CORNERS_PER_POINT,
        instances: 0..points,
    })
}

/// Uploads per-cell state and records the grid draw.
///
/// Owns one state vertex buffer that is rewritten every frame and only
/// reallocated when a larger state buffer arrives.
pub struct FrameRenderer {
    state_vbo: wgpu::Buffer,
    capacity: u64,
    /// Points described by the last upload.
    points: u32,
    warned_len_mismatch: bool,
}

impl FrameRenderer {
    /// Allocates the state buffer for `layout` at `vertex_components` floats
    /// per cell.
    pub fn new(device: &wgpu::Device, layout: &GridLayout, vertex_components: u32) -> Self {
        let bytes = layout.vertices_count() as u64 * vertex_components as u64 * 4;
        let capacity = bytes.next_power_of_two().max(MIN_STATE_CAPACITY);
        Self {
            state_vbo: create_state_buffer(device, capacity),
            capacity,
            points: 0,
            warned_len_mismatch: false,
        }
    }

    /// Copies `state` into the state buffer in full.
    pub fn upload(&mut self, ctx: &RenderCtx<'_>, layout: &GridLayout, state: &[f32], components: u32) {
        let points = draw_count(state.len(), components);
        let expected = layout.vertices_count() as usize * components as usize;
        if state.len() != expected && !self.warned_len_mismatch {
            log::warn!(
                "state buffer has {} values, grid expects {} ({} cells x {} components)",
                state.len(),
                expected,
                layout.vertices_count(),
                components
            );
            self.warned_len_mismatch = true;
        }

        let bytes: &[u8] = bytemuck::cast_slice(state);
        self.ensure_capacity(ctx.device, bytes.len() as u64);
        // write_buffer needs a 4-byte multiple, which f32 data always is.
        if !bytes.is_empty() {
            ctx.queue.write_buffer(&self.state_vbo, 0, bytes);
        }
        self.points = points;
    }

    /// Clears the target and draws the last uploaded state.
    pub fn encode(
        &self,
        target: &mut RenderTarget<'_>,
        program: &Program,
        uniforms: &UniformBinding,
        layout: &GridLayout,
        clear: Color,
    ) {
        let mut rpass = target.begin_cleared_pass("lattice grid pass", clear);
        let Some(plan) = plan_draw(self.points, program.vertex_components(), layout) else {
            return;
        };

        let [x, y, w, h] = plan.viewport;
        rpass.set_viewport(x, y, w, h, 0.0, 1.0);
        rpass.set_pipeline(program.pipeline());
        rpass.set_bind_group(0, uniforms.bind_group(), &[]);
        rpass.set_vertex_buffer(0, self.state_vbo.slice(..plan.state_bytes));
        rpass.draw(plan.vertices, plan.instances);
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, required: u64) {
        if required <= self.capacity {
            return;
        }
        let capacity = required.next_power_of_two().max(MIN_STATE_CAPACITY);
        log::debug!("growing state buffer {} -> {} bytes", self.capacity, capacity);
        self.state_vbo = create_state_buffer(device, capacity);
        self.capacity = capacity;
    }
}

fn create_state_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lattice grid state vbo"),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_count_divides_by_components() {
        assert_eq!(draw_count(100, 1), 100);
        assert_eq!(draw_count(400, 4), 100);
        assert_eq!(draw_count(0, 1), 0);
    }

    #[test]
    fn draw_count_drops_partial_point() {
        assert_eq!(draw_count(7, 2), 3);
    }

    #[test]
    fn draw_count_zero_components_draws_nothing() {
        assert_eq!(draw_count(10, 0), 0);
    }

    // The pass itself clears before the plan is consulted, so every frame
    // starts from the clear color whether or not a plan exists.

    #[test]
    fn full_state_draws_one_instance_per_cell() {
        let layout = GridLayout::derive(500, 500, 50);
        let points = draw_count(100, 1);
        let plan = plan_draw(points, 1, &layout).unwrap();
        assert_eq!(plan.instances, 0..layout.vertices_count());
        assert_eq!(plan.vertices, 0..6);
        assert_eq!(plan.state_bytes, 400);
    }

    #[test]
    fn viewport_covers_grid_dimension() {
        let layout = GridLayout::derive(510, 480, 50);
        let plan = plan_draw(layout.vertices_count(), 1, &layout).unwrap();
        assert_eq!(plan.viewport, [0.0, 0.0, 550.0, 500.0]);
    }

    #[test]
    fn wide_state_binds_every_component() {
        let layout = GridLayout::derive(100, 100, 10);
        let plan = plan_draw(100, 4, &layout).unwrap();
        assert_eq!(plan.state_bytes, 1600);
        assert_eq!(plan.instances, 0..100);
    }

    #[test]
    fn empty_frames_only_clear() {
        let layout = GridLayout::derive(500, 500, 50);
        assert_eq!(plan_draw(0, 1, &layout), None);
        assert_eq!(plan_draw(100, 1, &GridLayout::derive(0, 0, 50)), None);
    }
}
