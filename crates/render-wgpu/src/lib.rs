//! wgpu render backend.
//!
//! Draws every mesh in the scene as an instanced, Lambert-lit box, lit by the
//! scene's ambient lights and up to eight point lights.
//!
//! # Invariants
//! - Renderer never mutates the scene or the camera.
//! - Size-dependent attachments (depth, MSAA color) always match the surface.

mod gpu;
mod shaders;
mod surface;

pub use shaders::MAX_POINT_LIGHTS;
pub use surface::{GpuInitError, SurfaceRenderer};
