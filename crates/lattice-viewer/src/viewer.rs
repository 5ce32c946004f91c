use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use winit::dpi::LogicalSize;

use lattice_engine::coords::Resolution;
use lattice_engine::core::{App as EngineApp, AppControl, FrameCtx};
use lattice_engine::device::GpuInit;
use lattice_engine::paint::{Color, Palette};
use lattice_engine::render::grid::{EngineError, EngineState, GridConfig, GridEngine};
use lattice_engine::time::{StepSchedule, StepThrottle};
use lattice_engine::window::{Runtime, RuntimeConfig};

use crate::simulation::Simulation;

// ── Viewer ────────────────────────────────────────────────────────────────

/// Window + grid + simulation builder.
///
/// ```rust,ignore
/// Viewer::new()
///     .title("life")
///     .point_size(20)
///     .schedule(StepSchedule::FixedInterval(Duration::from_millis(250)))
///     .run::<Board>()?;
/// ```
#[derive(Debug, Clone)]
pub struct Viewer {
    title:    String,
    width:    f64,
    height:   f64,
    grid:     GridConfig,
    schedule: StepSchedule,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            title:    "lattice".to_string(),
            width:    800.0,
            height:   600.0,
            grid:     GridConfig::default(),
            schedule: StepSchedule::default(),
        }
    }

    /// Set the window title.
    pub fn title(mut self, t: impl Into<String>) -> Self {
        self.title = t.into();
        self
    }

    /// Set the initial window size in logical pixels. The grid rounds it up
    /// to whole cells.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width  = width;
        self.height = height;
        self
    }

    /// Set the cell edge length in physical pixels.
    pub fn point_size(mut self, px: u32) -> Self {
        self.grid.point_size = px;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.grid.palette = palette;
        self
    }

    pub fn clear(mut self, color: Color) -> Self {
        self.grid.clear = color;
        self
    }

    /// Set how often the simulation advances.
    pub fn schedule(mut self, schedule: StepSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn grid_config(&self) -> &GridConfig {
        &self.grid
    }

    pub fn step_schedule(&self) -> StepSchedule {
        self.schedule
    }

    /// Opens the window and runs `S` until the window is closed.
    ///
    /// Returns an error if the window, the GPU, or the grid engine could not
    /// be brought up.
    pub fn run<S>(self) -> Result<()>
    where
        S: Simulation + 'static,
    {
        self.grid.validate()?;

        let config = RuntimeConfig {
            title:        self.title.clone(),
            initial_size: LogicalSize::new(self.width, self.height),
            ..RuntimeConfig::default()
        };

        let failure = Rc::new(RefCell::new(None));
        let app = ViewerApp::<S>::new(self, failure.clone());
        Runtime::run(config, GpuInit::default(), app)?;

        match failure.borrow_mut().take() {
            Some(err) => Err(anyhow!(err).context("grid engine failed to initialize")),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

// ── ViewerApp ─────────────────────────────────────────────────────────────

/// Drives one simulation through the grid engine, once per refresh tick.
struct ViewerApp<S> {
    engine:   GridEngine,
    throttle: StepThrottle,
    sim:      Option<S>,
    /// Reused state buffer.
    state:    Vec<f32>,
    failure:  Rc<RefCell<Option<EngineError>>>,
}

impl<S: Simulation> ViewerApp<S> {
    fn new(viewer: Viewer, failure: Rc<RefCell<Option<EngineError>>>) -> Self {
        Self {
            engine:   GridEngine::new(viewer.grid),
            throttle: StepThrottle::new(viewer.schedule),
            sim:      None,
            state:    Vec::new(),
            failure,
        }
    }

    /// Replaces the simulation with a fresh one for `resolution`.
    fn rebuild(&mut self, resolution: Resolution) {
        log::debug!(
            "new simulation for {} rows x {} cols",
            resolution.rows,
            resolution.cols
        );
        self.sim = Some(S::new(resolution.rows as usize, resolution.cols as usize));
        self.throttle.reset();
    }
}

impl<S: Simulation> EngineApp for ViewerApp<S> {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if matches!(self.engine.state(), EngineState::Uninitialized) {
            match self.engine.initialize(ctx) {
                Ok(layout) => self.rebuild(layout.resolution),
                Err(err) => {
                    *self.failure.borrow_mut() = Some(err);
                    return AppControl::Exit;
                }
            }
        }

        if let Some(resolution) = self.engine.sync_surface(ctx) {
            self.rebuild(resolution);
        }

        let Some(sim) = self.sim.as_mut() else {
            return AppControl::Continue;
        };

        if self.throttle.should_step(&ctx.time) {
            sim.advance();
            sim.write_state(&mut self.state);
            let components = sim.components();
            self.engine.draw(ctx, &self.state, components)
        } else {
            self.engine.redraw(ctx)
        }
    }
}
