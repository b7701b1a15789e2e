//! Rendering adapter: renderer-agnostic interface and perspective camera.
//!
//! # Invariants
//! - Renderers never mutate the scene or the camera.
//! - The camera projection only changes on an explicit update.

mod camera;
mod renderer;

pub use camera::PerspectiveCamera;
pub use renderer::{DebugTextRenderer, RenderError, Renderer, RendererOptions};
