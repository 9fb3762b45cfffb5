//! Real-time viewer for a stylised black hole.
//!
//! Each frame a fullscreen fragment shader marches one ray per pixel
//! through a bent-light field around a fixed singularity, accumulating
//! emission from a thin accretion disk and a photon ring. The image is then
//! bloomed, tone mapped and presented. Everything except the `render`
//! module runs headless, which keeps camera, controller, uniform and
//! kernel logic testable without a GPU.

pub mod app;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod frame;
pub mod input;
pub mod kernel;
pub mod params;
pub mod render;
pub mod resize;
pub mod uniforms;

pub use camera::{CameraBasis, CameraRig};
pub use config::ViewerConfig;
pub use controls::{OrbitControls, PoseDelta};
pub use error::ConfigError;
pub use frame::{FrameClock, FrameLoop, FrameTarget};
pub use input::{PointerButton, PointerEvent};
pub use params::ShaderParameterSet;
pub use render::Renderer;
pub use resize::{ResizeHandler, TargetExtent, Viewport};
pub use uniforms::{FrameUniform, UniformFrame};
