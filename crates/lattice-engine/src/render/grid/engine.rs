use std::borrow::Cow;
use std::fmt;

use winit::dpi::PhysicalSize;

use crate::coords::{Dimension, Resolution};
use crate::core::{AppControl, FrameCtx};
use crate::paint::{Color, Palette};
use crate::render::{RenderCtx, RenderTarget};

use super::frame::FrameRenderer;
use super::layout::GridLayout;
use super::shader::{
    compile, link, state_format, CompileError, LinkError, Program, ShaderStage,
    GRID_FRAGMENT_SOURCE, GRID_VERTEX_SOURCE, MAX_VERTEX_COMPONENTS,
};
use super::uniforms::{bind_constants, UniformBinding};

/// Attribute width the program is linked with before the first draw.
const INITIAL_VERTEX_COMPONENTS: u32 = 1;

// ── configuration ─────────────────────────────────────────────────────────

/// WGSL sources for the two stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: Cow::Borrowed(GRID_VERTEX_SOURCE),
            fragment: Cow::Borrowed(GRID_FRAGMENT_SOURCE),
        }
    }
}

/// Immutable engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Edge length of one cell, in physical pixels. Must be non-zero.
    pub point_size: u32,
    pub palette: Palette,
    /// Color the target is cleared to before each frame.
    pub clear: Color,
    pub shaders: ShaderSources,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            point_size: 50,
            palette: Palette::default(),
            clear: Color::transparent(),
            shaders: ShaderSources::default(),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.point_size == 0 {
            return Err(EngineError::InvalidConfig("point size must be at least 1 pixel".into()));
        }
        let colors = [self.palette.on, self.palette.off, self.clear];
        if !colors.iter().all(|c| c.is_finite()) {
            return Err(EngineError::InvalidConfig("colors must be finite".into()));
        }
        Ok(())
    }
}

// ── errors ────────────────────────────────────────────────────────────────

/// Why the engine could not be initialized.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    InvalidConfig(String),
    Compile(CompileError),
    Link(LinkError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidConfig(msg) => write!(f, "invalid grid configuration: {msg}"),
            EngineError::Compile(e) => e.fmt(f),
            EngineError::Link(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::InvalidConfig(_) => None,
            EngineError::Compile(e) => Some(e),
            EngineError::Link(e) => Some(e),
        }
    }
}

impl From<CompileError> for EngineError {
    fn from(e: CompileError) -> Self {
        EngineError::Compile(e)
    }
}

impl From<LinkError> for EngineError {
    fn from(e: LinkError) -> Self {
        EngineError::Link(e)
    }
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Every GPU resource of an initialized engine, created in one step.
pub struct GridRenderer {
    layout: GridLayout,
    program: Program,
    uniforms: UniformBinding,
    frame: FrameRenderer,
    warned_components: bool,
}

impl GridRenderer {
    fn build(ctx: &RenderCtx<'_>, layout: GridLayout, config: &GridConfig) -> Result<Self, EngineError> {
        let vs = compile(ctx.device, &config.shaders.vertex, ShaderStage::Vertex)?;
        let fs = compile(ctx.device, &config.shaders.fragment, ShaderStage::Fragment)?;
        let program = link(ctx.device, vs, fs, ctx.surface_format, INITIAL_VERTEX_COMPONENTS)?;
        let uniforms = bind_constants(
            ctx.device,
            ctx.queue,
            &program,
            ctx.surface_format,
            &layout,
            &config.palette,
        );
        let frame = FrameRenderer::new(ctx.device, &layout, INITIAL_VERTEX_COMPONENTS);

        Ok(Self {
            layout,
            program,
            uniforms,
            frame,
            warned_components: false,
        })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        state: Option<(&[f32], u32)>,
        clear: Color,
    ) {
        if let Some((state, components)) = state {
            if let Err(e) = self.program.relayout(ctx.device, components) {
                log::error!("{e}");
                return;
            }
            self.frame.upload(ctx, &self.layout, state, components);
        }
        self.frame.encode(target, &self.program, &self.uniforms, &self.layout, clear);
    }
}

// ── engine ────────────────────────────────────────────────────────────────

/// Initialization state; the only thing frame operations dispatch on.
pub enum EngineState {
    Uninitialized,
    Ready(Box<GridRenderer>),
    Failed(EngineError),
}

/// Point-grid rendering engine for one window.
///
/// Lifecycle: [`GridEngine::new`] → [`GridEngine::initialize`] on the first
/// frame → [`GridEngine::draw`] / [`GridEngine::redraw`] every frame. Until
/// initialization succeeds every frame operation is a no-op.
pub struct GridEngine {
    config: GridConfig,
    state: EngineState,
    /// Window size at the last layout derivation.
    measured: PhysicalSize<u32>,
}

impl GridEngine {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            state: EngineState::Uninitialized,
            measured: PhysicalSize::new(0, 0),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    pub fn layout(&self) -> Option<GridLayout> {
        match &self.state {
            EngineState::Ready(r) => Some(r.layout),
            _ => None,
        }
    }

    /// Measures the window, sizes the surface to whole cells, then builds
    /// the program, uniforms and state buffer.
    ///
    /// On failure the engine is left `Failed` and draws nothing. Calling it
    /// again rebuilds every resource from scratch.
    pub fn initialize(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<GridLayout, EngineError> {
        let result = self.try_initialize(ctx);
        match &result {
            Ok(layout) => log::info!(
                "grid {}x{} cells of {}px, surface {}x{}",
                layout.resolution.cols,
                layout.resolution.rows,
                layout.point_size,
                layout.dimension.width,
                layout.dimension.height
            ),
            Err(e) => {
                log::error!("grid engine initialization failed: {e}");
                self.state = EngineState::Failed(e.clone());
            }
        }
        result
    }

    fn try_initialize(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<GridLayout, EngineError> {
        self.config.validate()?;

        let measured = ctx.window.inner_size();
        let layout = GridLayout::for_surface(measured, self.config.point_size);
        check_fits(&layout, max_surface_dimension(ctx))?;
        apply_surface(ctx, measured, &layout);

        let renderer = GridRenderer::build(&RenderCtx::from_gpu(ctx.gpu), layout, &self.config)?;
        self.state = EngineState::Ready(Box::new(renderer));
        self.measured = measured;
        Ok(layout)
    }

    /// Re-derives the layout if the window size changed since the last
    /// derivation and keeps the surface backing at the grid dimension.
    ///
    /// Returns the new resolution when it changed, so the caller can rebuild
    /// a simulation of matching size.
    pub fn sync_surface(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Option<Resolution> {
        let EngineState::Ready(renderer) = &mut self.state else { return None };

        let measured = ctx.window.inner_size();
        let change = classify_measurement(
            self.measured,
            measured,
            self.config.point_size,
            max_surface_dimension(ctx),
        );

        let layout = match change {
            SurfaceChange::Unchanged => {
                // The runtime resizes the surface to the window on every
                // resize event; put the grid dimension back.
                let wanted = renderer.layout.surface_size();
                if ctx.gpu.size() != wanted {
                    ctx.gpu.resize(wanted);
                }
                return None;
            }
            // Minimized: keep the grid and its simulation until the window
            // comes back. Drawing is skipped while the surface is empty.
            SurfaceChange::Hidden => return None,
            SurfaceChange::TooLarge(layout) => {
                log::warn!(
                    "keeping {}x{} grid: a {}x{} px surface exceeds the device limit",
                    renderer.layout.resolution.cols,
                    renderer.layout.resolution.rows,
                    layout.dimension.width,
                    layout.dimension.height
                );
                self.measured = measured;
                return None;
            }
            SurfaceChange::Relayout(layout) => layout,
        };

        self.measured = measured;
        apply_surface(ctx, measured, &layout);

        if layout == renderer.layout {
            return None;
        }

        let previous = renderer.layout.resolution;
        renderer.layout = layout;
        renderer.uniforms.update(ctx.gpu.queue(), &layout, &self.config.palette);
        log::info!(
            "grid re-derived: {}x{} -> {}x{} cells",
            previous.cols,
            previous.rows,
            layout.resolution.cols,
            layout.resolution.rows
        );

        (previous != layout.resolution).then_some(layout.resolution)
    }

    /// Clears the surface, uploads `state` (`components` floats per cell,
    /// row-major) and draws one point per cell.
    pub fn draw(&mut self, ctx: &mut FrameCtx<'_, '_>, state: &[f32], components: u32) -> AppControl {
        let EngineState::Ready(renderer) = &mut self.state else {
            return AppControl::Continue;
        };
        if state_format(components).is_none() {
            if !renderer.warned_components {
                log::warn!(
                    "ignoring draw with {components} state components; expected 1..={MAX_VERTEX_COMPONENTS}"
                );
                renderer.warned_components = true;
            }
            return AppControl::Continue;
        }
        render(ctx, renderer, Some((state, components)), self.config.clear)
    }

    /// Redraws the last uploaded state without a new upload.
    pub fn redraw(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let EngineState::Ready(renderer) = &mut self.state else {
            return AppControl::Continue;
        };
        render(ctx, renderer, None, self.config.clear)
    }
}

/// What a new window measurement means for the current layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SurfaceChange {
    /// Same measurement as at the last derivation.
    Unchanged,
    /// Zero-sized window; the current layout is kept.
    Hidden,
    /// The derived grid would not fit a surface texture.
    TooLarge(GridLayout),
    Relayout(GridLayout),
}

fn classify_measurement(
    last: PhysicalSize<u32>,
    measured: PhysicalSize<u32>,
    point_size: u32,
    max_dimension: u32,
) -> SurfaceChange {
    if measured == last {
        return SurfaceChange::Unchanged;
    }
    if measured.width == 0 || measured.height == 0 {
        return SurfaceChange::Hidden;
    }
    let layout = GridLayout::for_surface(measured, point_size);
    match check_fits(&layout, max_dimension) {
        Ok(()) => SurfaceChange::Relayout(layout),
        Err(_) => SurfaceChange::TooLarge(layout),
    }
}

/// Rejects grids whose surface would exceed `max_dimension` on either axis.
fn check_fits(layout: &GridLayout, max_dimension: u32) -> Result<(), EngineError> {
    let Dimension { width, height } = layout.dimension;
    if width > max_dimension || height > max_dimension {
        return Err(EngineError::InvalidConfig(format!(
            "a {width}x{height} px grid surface exceeds the device limit of {max_dimension} px; \
             use a smaller point size (currently {})",
            layout.point_size
        )));
    }
    Ok(())
}

fn max_surface_dimension(ctx: &FrameCtx<'_, '_>) -> u32 {
    ctx.gpu.device().limits().max_texture_dimension_2d
}

fn render(
    ctx: &mut FrameCtx<'_, '_>,
    renderer: &mut GridRenderer,
    state: Option<(&[f32], u32)>,
    clear: Color,
) -> AppControl {
    // Nothing to present into while minimized, and the viewport must never
    // exceed the configured surface.
    if renderer.layout.dimension.is_empty() || ctx.gpu.size() != renderer.layout.surface_size() {
        return AppControl::Continue;
    }
    ctx.render(|rctx, target| renderer.draw(rctx, target, state, clear))
}

/// Sizes the drawing area and the surface backing to the grid dimension.
fn apply_surface(ctx: &mut FrameCtx<'_, '_>, measured: PhysicalSize<u32>, layout: &GridLayout) {
    if layout.dimension.is_empty() {
        return;
    }
    let size = layout.surface_size();
    if measured != size {
        ctx.window.request_inner_size(size);
    }
    ctx.gpu.resize(size);
}
