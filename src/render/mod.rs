//! GPU side of the viewer: WGSL sources, the offscreen render graph and the
//! window-bound renderer.

pub mod graph;
mod renderer;
pub mod shaders;

pub use graph::{PostUniform, PostUniforms, RenderGraph, Stage};
pub use renderer::Renderer;
