use bytemuck::{Pod, Zeroable};

use crate::paint::Palette;

use super::layout::GridLayout;
use super::shader::Program;

/// Grid constants as laid out in the WGSL uniform block.
///
/// Vec4 members come first so every member sits at its natural WGSL
/// alignment; the tail pads the struct to its 16-byte-aligned size.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridUniforms {
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub dimension: [f32; 2],
    pub resolution: [f32; 2],
    pub point_size: f32,
    pub _pad: [f32; 3],
}

impl GridUniforms {
    /// Packs `layout` and `palette`; colors are linearized for sRGB targets
    /// so they come out on screen as configured.
    pub fn new(layout: &GridLayout, palette: &Palette, srgb_target: bool) -> Self {
        let (on, off) = if srgb_target {
            (palette.on.to_linear(), palette.off.to_linear())
        } else {
            (palette.on, palette.off)
        };
        Self {
            color1: on.to_array(),
            color2: off.to_array(),
            dimension: [layout.dimension.width as f32, layout.dimension.height as f32],
            resolution: [layout.resolution.cols as f32, layout.resolution.rows as f32],
            point_size: layout.point_size as f32,
            _pad: [0.0; 3],
        }
    }

    /// Size of the block; non-zero by construction.
    pub(super) fn min_binding_size() -> std::num::NonZeroU64 {
        const SIZE: u64 = std::mem::size_of::<GridUniforms>() as u64;
        match std::num::NonZeroU64::new(SIZE) {
            Some(size) => size,
            None => unreachable!(),
        }
    }
}

/// The uploaded grid constants and the bind group exposing them.
pub struct UniformBinding {
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    srgb_target: bool,
}

impl UniformBinding {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Rewrites the constants after the layout was re-derived.
    pub fn update(&self, queue: &wgpu::Queue, layout: &GridLayout, palette: &Palette) {
        let u = GridUniforms::new(layout, palette, self.srgb_target);
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&u));
    }
}

/// Uploads the grid constants for `program` once.
///
/// A program whose vertex stage does not read the block still gets it
/// bound; the values are inert and no error is raised.
pub fn bind_constants(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    program: &Program,
    surface_format: wgpu::TextureFormat,
    layout: &GridLayout,
    palette: &Palette,
) -> UniformBinding {
    if !program.uses_uniforms() {
        log::debug!("grid uniforms are not read by the vertex stage; binding is inert");
    }

    let ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lattice grid ubo"),
        size: std::mem::size_of::<GridUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lattice grid bind group"),
        layout: program.bind_group_layout(),
        entries: &[wgpu::BindGroupEntry {
            binding: super::shader::UNIFORM_BINDING,
            resource: ubo.as_entire_binding(),
        }],
    });

    let binding = UniformBinding {
        ubo,
        bind_group,
        srgb_target: surface_format.is_srgb(),
    };
    binding.update(queue, layout, palette);
    binding
}
