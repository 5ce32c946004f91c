//! Point-grid renderer.
//!
//! Draws one square point per cell of a row-major state buffer:
//! - `layout`: surface measurement → resolution + dimension
//! - `shader`: WGSL compile/validate, interface check, pipeline link
//! - `uniforms`: grid constants uploaded once per layout
//! - `frame`: per-frame state upload and draw
//! - `engine`: lifecycle that ties the above to a window

mod engine;
mod frame;
mod layout;
mod shader;
mod uniforms;

pub use engine::{EngineError, EngineState, GridConfig, GridEngine, GridRenderer, ShaderSources};
pub use frame::{draw_count, plan_draw, DrawPlan, FrameRenderer};
pub use layout::GridLayout;
pub use shader::{
    check_interface, check_source, compile, link, state_format, CheckedShader, CompileError,
    LinkError, Program, Shader, ShaderStage, GRID_FRAGMENT_SOURCE, GRID_VERTEX_SOURCE,
    MAX_VERTEX_COMPONENTS, STATE_LOCATION, UNIFORM_BINDING, UNIFORM_GROUP,
};
pub use uniforms::{bind_constants, GridUniforms, UniformBinding};
