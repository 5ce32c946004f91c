//! Shader compilation and program linking for the grid pipeline.
//!
//! WGSL is checked with `naga` before anything reaches the device: a bad
//! source, a mismatched stage interface, or resources the pipeline layout
//! does not provide come back as a typed error carrying the full diagnostic
//! instead of a wgpu validation panic.

use std::collections::BTreeMap;
use std::fmt;

use super::uniforms::GridUniforms;

pub const GRID_VERTEX_SOURCE: &str = include_str!("shaders/grid_vs.wgsl");
pub const GRID_FRAGMENT_SOURCE: &str = include_str!("shaders/grid_fs.wgsl");

/// Vertex attribute slot carrying the per-cell state.
pub const STATE_LOCATION: u32 = 0;

/// Uniform block slot (`@group(0) @binding(0)`).
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

/// Largest attribute width the state slot accepts.
pub const MAX_VERTEX_COMPONENTS: u32 = 4;

// ── stages ────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point every module compiled for this stage must export.
    pub const fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }

    const fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "lattice grid vertex shader",
            ShaderStage::Fragment => "lattice grid fragment shader",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

// ── errors ────────────────────────────────────────────────────────────────

/// A shader source that is not valid for its stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub stage: ShaderStage,
    /// Compiler diagnostic, rendered against the source.
    pub log: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shader failed to compile:\n{}", self.stage, self.log)
    }
}

impl std::error::Error for CompileError {}

/// Two stages that cannot form a program.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkError {
    /// One line per interface problem.
    pub log: String,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program failed to link:\n{}", self.log)
    }
}

impl std::error::Error for LinkError {}

// ── compile ───────────────────────────────────────────────────────────────

/// Validated shader IR for one stage, independent of any device.
#[derive(Debug)]
pub struct CheckedShader {
    stage: ShaderStage,
    module: naga::Module,
}

impl CheckedShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == self.stage.naga() && ep.name == self.stage.entry_point())
    }

    /// Whether the module declares the grid uniform block.
    ///
    /// An absent block is not an error: the binder still binds it and the
    /// values are simply never read.
    pub fn declares_uniform_block(&self) -> bool {
        self.module.global_variables.iter().any(|(_, var)| {
            var.space == naga::AddressSpace::Uniform
                && var
                    .binding
                    .as_ref()
                    .is_some_and(|b| b.group == UNIFORM_GROUP && b.binding == UNIFORM_BINDING)
        })
    }
}

/// Parses and validates `source` for `stage` without touching the GPU.
pub fn check_source(source: &str, stage: ShaderStage) -> Result<CheckedShader, CompileError> {
    let fail = |log: String| CompileError { stage, log };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| fail(e.emit_to_string(source)))?;

    let checked = CheckedShader { stage, module };
    if checked.entry_point().is_none() {
        return Err(fail(format!(
            "no @{stage} entry point named `{}`",
            stage.entry_point()
        )));
    }
    Ok(checked)
}

/// A compiled shader: validated IR plus the device module built from it.
#[derive(Debug)]
pub struct Shader {
    checked: CheckedShader,
    module: wgpu::ShaderModule,
}

impl Shader {
    pub fn stage(&self) -> ShaderStage {
        self.checked.stage
    }

    pub fn checked(&self) -> &CheckedShader {
        &self.checked
    }
}

/// Compiles `source` for `stage` on `device`.
pub fn compile(device: &wgpu::Device, source: &str, stage: ShaderStage) -> Result<Shader, CompileError> {
    let checked = check_source(source, stage)?;
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage.label()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    Ok(Shader { checked, module })
}

// ── link ──────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Varying<'m> {
    ty: &'m naga::TypeInner,
    interpolation: Option<naga::Interpolation>,
    sampling: Option<naga::Sampling>,
}

/// Collects `@location` bindings from a binding or, for struct types, from
/// the struct members.
fn collect_locations<'m>(
    module: &'m naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeMap<u32, Varying<'m>>,
) {
    match binding {
        Some(naga::Binding::Location { location, interpolation, sampling, .. }) => {
            out.insert(
                *location,
                Varying {
                    ty: &module.types[ty].inner,
                    interpolation: *interpolation,
                    sampling: *sampling,
                },
            );
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

/// Resources declared by `shader` that the grid pipeline layout cannot
/// satisfy: anything but the uniform block, the block outside the vertex
/// stage, or a block larger than [`GridUniforms`].
fn check_bindings(shader: &CheckedShader, problems: &mut Vec<String>) {
    let module = &shader.module;
    let block_size = GridUniforms::min_binding_size().get();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        if binding.group != UNIFORM_GROUP || binding.binding != UNIFORM_BINDING {
            problems.push(format!(
                "{} stage declares `{name}` at @group({}) @binding({}); only @group({UNIFORM_GROUP}) @binding({UNIFORM_BINDING}) is bound",
                shader.stage, binding.group, binding.binding
            ));
            continue;
        }
        if shader.stage != ShaderStage::Vertex {
            problems.push(format!(
                "{} stage declares the grid uniform block `{name}`; it is visible to the vertex stage only",
                shader.stage
            ));
            continue;
        }
        if var.space != naga::AddressSpace::Uniform {
            problems.push(format!("`{name}` must be declared var<uniform>, found {:?}", var.space));
            continue;
        }

        let size = u64::from(module.types[var.ty].inner.size(module.to_ctx()));
        if size > block_size {
            problems.push(format!(
                "uniform block `{name}` is {size} bytes; the bound buffer holds {block_size}"
            ));
        }
    }
}

/// Checks the two stages against each other and against the pipeline
/// layout [`link`] builds: fragment inputs must be produced by the vertex
/// stage with the same type and interpolation, vertex inputs must match the
/// state attribute, and declared resources must match the uniform binding.
pub fn check_interface(vs: &CheckedShader, fs: &CheckedShader) -> Result<(), LinkError> {
    let mut problems = Vec::new();

    if vs.stage != ShaderStage::Vertex {
        problems.push(format!("expected a vertex shader, got a {} shader", vs.stage));
    }
    if fs.stage != ShaderStage::Fragment {
        problems.push(format!("expected a fragment shader, got a {} shader", fs.stage));
    }
    let (Some(vs_ep), Some(fs_ep)) = (vs.entry_point(), fs.entry_point()) else {
        problems.push("missing entry point".to_string());
        return Err(LinkError { log: problems.join("\n") });
    };
    if !problems.is_empty() {
        return Err(LinkError { log: problems.join("\n") });
    }

    let mut outputs = BTreeMap::new();
    if let Some(result) = &vs_ep.function.result {
        collect_locations(&vs.module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut attributes = BTreeMap::new();
    for arg in &vs_ep.function.arguments {
        collect_locations(&vs.module, arg.ty, arg.binding.as_ref(), &mut attributes);
    }
    for (location, attribute) in &attributes {
        if *location != STATE_LOCATION {
            problems.push(format!(
                "vertex input @location({location}) has no vertex buffer; only @location({STATE_LOCATION}) is fed"
            ));
            continue;
        }
        match attribute.ty {
            naga::TypeInner::Scalar(s) | naga::TypeInner::Vector { scalar: s, .. }
                if *s == naga::Scalar::F32 => {}
            other => problems.push(format!(
                "vertex input @location({location}) must be f32 or vecN<f32>, found {other:?}"
            )),
        }
    }

    check_bindings(vs, &mut problems);
    check_bindings(fs, &mut problems);

    let mut inputs = BTreeMap::new();
    for arg in &fs_ep.function.arguments {
        collect_locations(&fs.module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    for (location, input) in &inputs {
        match outputs.get(location) {
            None => problems.push(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            )),
            Some(output) if output.ty != input.ty => problems.push(format!(
                "@location({location}) type mismatch: vertex writes {:?}, fragment reads {:?}",
                output.ty, input.ty
            )),
            Some(output)
                if output.interpolation != input.interpolation
                    || output.sampling != input.sampling =>
            {
                problems.push(format!(
                    "@location({location}) interpolation mismatch: vertex {:?}/{:?}, fragment {:?}/{:?}",
                    output.interpolation, output.sampling, input.interpolation, input.sampling
                ))
            }
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(LinkError { log: problems.join("\n") })
    }
}

/// Vertex format for a state attribute of `components` floats.
pub fn state_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// A linked program: both stages, the uniform layout, and the render
/// pipeline for the current state attribute width.
pub struct Program {
    vs: Shader,
    fs: Shader,
    surface_format: wgpu::TextureFormat,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipeline: wgpu::RenderPipeline,
    vertex_components: u32,
}

impl Program {
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn vertex_components(&self) -> u32 {
        self.vertex_components
    }

    /// Whether the vertex stage reads the grid uniforms at all.
    pub fn uses_uniforms(&self) -> bool {
        self.vs.checked.declares_uniform_block()
    }

    /// Rebuilds the pipeline for a different state attribute width.
    ///
    /// The stages were already linked, so only the vertex layout changes.
    pub fn relayout(&mut self, device: &wgpu::Device, vertex_components: u32) -> Result<(), LinkError> {
        if vertex_components == self.vertex_components {
            return Ok(());
        }
        self.pipeline = create_pipeline(
            device,
            &self.pipeline_layout,
            &self.vs,
            &self.fs,
            self.surface_format,
            vertex_components,
        )?;
        self.vertex_components = vertex_components;
        log::debug!("grid pipeline rebuilt for {vertex_components} state component(s)");
        Ok(())
    }
}

/// Links a vertex and a fragment shader into a program targeting
/// `surface_format`, with a state attribute of `vertex_components` floats.
pub fn link(
    device: &wgpu::Device,
    vs: Shader,
    fs: Shader,
    surface_format: wgpu::TextureFormat,
    vertex_components: u32,
) -> Result<Program, LinkError> {
    check_interface(&vs.checked, &fs.checked)?;

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("lattice grid bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: UNIFORM_BINDING,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: Some(GridUniforms::min_binding_size()),
            },
            count: None,
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("lattice grid pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = create_pipeline(device, &pipeline_layout, &vs, &fs, surface_format, vertex_components)?;

    Ok(Program {
        vs,
        fs,
        surface_format,
        bind_group_layout,
        pipeline_layout,
        pipeline,
        vertex_components,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    vs: &Shader,
    fs: &Shader,
    surface_format: wgpu::TextureFormat,
    vertex_components: u32,
) -> Result<wgpu::RenderPipeline, LinkError> {
    let format = state_format(vertex_components).ok_or_else(|| LinkError {
        log: format!(
            "state attribute must have 1..={MAX_VERTEX_COMPONENTS} components, got {vertex_components}"
        ),
    })?;

    // Tightly packed, no offset, one value set per point instance.
    let attributes = [wgpu::VertexAttribute {
        format,
        offset: 0,
        shader_location: STATE_LOCATION,
    }];
    let state_layout = wgpu::VertexBufferLayout {
        array_stride: format.size(),
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &attributes,
    };

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("lattice grid pipeline"),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: &vs.module,
            entry_point: Some(ShaderStage::Vertex.entry_point()),
            compilation_options: Default::default(),
            buffers: &[state_layout],
        },

        fragment: Some(wgpu::FragmentState {
            module: &fs.module,
            entry_point: Some(ShaderStage::Fragment.entry_point()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex() -> CheckedShader {
        check_source(GRID_VERTEX_SOURCE, ShaderStage::Vertex).unwrap()
    }

    fn fragment() -> CheckedShader {
        check_source(GRID_FRAGMENT_SOURCE, ShaderStage::Fragment).unwrap()
    }

    // ── compile ───────────────────────────────────────────────────────────

    #[test]
    fn grid_stages_compile() {
        assert_eq!(vertex().stage(), ShaderStage::Vertex);
        assert_eq!(fragment().stage(), ShaderStage::Fragment);
    }

    #[test]
    fn syntax_error_carries_log() {
        let err = check_source("fn vs_main( {", ShaderStage::Vertex).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Vertex);
        assert!(!err.log.is_empty());
        assert!(err.to_string().starts_with("vertex shader failed to compile"));
    }

    #[test]
    fn semantic_error_carries_log() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = check_source(src, ShaderStage::Fragment).unwrap_err();
        assert!(!err.log.is_empty());
    }

    #[test]
    fn wrong_stage_is_a_compile_error() {
        let err = check_source(GRID_FRAGMENT_SOURCE, ShaderStage::Vertex).unwrap_err();
        assert!(err.log.contains("vs_main"), "{}", err.log);
    }

    #[test]
    fn uniform_block_reflection() {
        assert!(vertex().declares_uniform_block());
        assert!(!fragment().declares_uniform_block());
    }

    // ── link ──────────────────────────────────────────────────────────────

    #[test]
    fn grid_stages_link() {
        check_interface(&vertex(), &fragment()).unwrap();
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let err = check_interface(&fragment(), &vertex()).unwrap_err();
        assert!(err.log.contains("expected a vertex shader"), "{}", err.log);
    }

    #[test]
    fn missing_varying_fails_to_link() {
        let fs = check_source(
            "@fragment fn fs_main(@location(5) @interpolate(flat) x: f32) -> @location(0) vec4<f32> {
                return vec4<f32>(x);
            }",
            ShaderStage::Fragment,
        )
        .unwrap();
        let err = check_interface(&vertex(), &fs).unwrap_err();
        assert!(err.log.contains("@location(5)"), "{}", err.log);
    }

    #[test]
    fn mismatched_varying_type_fails_to_link() {
        let fs = check_source(
            "@fragment fn fs_main(@location(0) @interpolate(flat) state: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(state, 0.0, 1.0);
            }",
            ShaderStage::Fragment,
        )
        .unwrap();
        let err = check_interface(&vertex(), &fs).unwrap_err();
        assert!(err.log.contains("type mismatch"), "{}", err.log);
    }

    #[test]
    fn mismatched_interpolation_fails_to_link() {
        let fs = check_source(
            "@fragment fn fs_main(@location(0) state: f32) -> @location(0) vec4<f32> {
                return vec4<f32>(state);
            }",
            ShaderStage::Fragment,
        )
        .unwrap();
        let err = check_interface(&vertex(), &fs).unwrap_err();
        assert!(err.log.contains("interpolation mismatch"), "{}", err.log);
    }

    #[test]
    fn fragment_may_read_a_subset() {
        let fs = check_source(
            "@fragment fn fs_main(@location(1) @interpolate(flat) c: vec4<f32>) -> @location(0) vec4<f32> {
                return c;
            }",
            ShaderStage::Fragment,
        )
        .unwrap();
        check_interface(&vertex(), &fs).unwrap();
    }

    #[test]
    fn fragment_reading_uniforms_fails_to_link() {
        let fs = check_source(
            "struct Colors { on: vec4<f32> }
            @group(0) @binding(0) var<uniform> grid: Colors;
            @fragment fn fs_main(@location(0) @interpolate(flat) state: f32) -> @location(0) vec4<f32> {
                return grid.on * state;
            }",
            ShaderStage::Fragment,
        )
        .unwrap();
        let err = check_interface(&vertex(), &fs).unwrap_err();
        assert!(err.log.contains("vertex stage only"), "{}", err.log);
    }

    #[test]
    fn oversized_uniform_block_fails_to_link() {
        let src = GRID_VERTEX_SOURCE.replace(
            "    point_size: f32,\n}",
            "    point_size: f32,\n    extra: mat4x4<f32>,\n}",
        );
        assert_ne!(src, GRID_VERTEX_SOURCE);
        let vs = check_source(&src, ShaderStage::Vertex).unwrap();
        let err = check_interface(&vs, &fragment()).unwrap_err();
        assert!(err.log.contains("the bound buffer holds 64"), "{}", err.log);
    }

    #[test]
    fn extra_binding_fails_to_link() {
        let src = format!(
            "{GRID_VERTEX_SOURCE}\n@group(1) @binding(0) var<uniform> other: vec4<f32>;\n"
        );
        let vs = check_source(&src, ShaderStage::Vertex).unwrap();
        let err = check_interface(&vs, &fragment()).unwrap_err();
        assert!(err.log.contains("@group(1) @binding(0)"), "{}", err.log);
    }

    #[test]
    fn unfed_vertex_input_fails_to_link() {
        let src = GRID_VERTEX_SOURCE.replace(
            "@location(0) state: f32,",
            "@location(0) state: f32,\n    @location(1) extra: f32,",
        );
        assert_ne!(src, GRID_VERTEX_SOURCE);
        let vs = check_source(&src, ShaderStage::Vertex).unwrap();
        let err = check_interface(&vs, &fragment()).unwrap_err();
        assert!(err.log.contains("vertex input @location(1)"), "{}", err.log);
    }

    // ── attribute ─────────────────────────────────────────────────────────

    #[test]
    fn state_format_widths() {
        for n in 1..=MAX_VERTEX_COMPONENTS {
            let f = state_format(n).unwrap();
            assert_eq!(f.size(), 4 * n as u64);
        }
        assert_eq!(state_format(0), None);
        assert_eq!(state_format(5), None);
    }
}
