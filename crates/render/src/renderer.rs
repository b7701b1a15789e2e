use crate::camera::PerspectiveCamera;
use orbitview_common::{Color, Viewport};
use orbitview_scene::{NodeKind, Scene};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Construction options shared by all renderer backends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Clear to a transparent background and composite with premultiplied alpha.
    pub alpha: bool,
    /// Multisample the color target.
    pub antialias: bool,
    pub clear_color: Color,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: true,
            clear_color: Color::BLACK,
        }
    }
}

impl RendererOptions {
    /// Clear value as RGBA; alpha is 0 when `alpha` is enabled.
    pub fn clear_rgba(&self) -> [f64; 4] {
        let a = if self.alpha { 0.0 } else { 1.0 };
        [
            self.clear_color.r as f64,
            self.clear_color.g as f64,
            self.clear_color.b as f64,
            a,
        ]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The surface must be reconfigured before the next frame.
    #[error("render surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("renderer out of memory")]
    OutOfMemory,
    #[error("renderer backend error: {0}")]
    Backend(String),
}

impl RenderError {
    /// Whether the render loop can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::SurfaceLost | RenderError::Timeout)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and camera and never mutates them.
pub trait Renderer {
    /// The output type produced by one render pass.
    type Output;

    /// Resize the drawable surface.
    fn set_size(&mut self, viewport: Viewport);

    /// Current drawable surface size.
    fn size(&self) -> Viewport;

    /// Issue one render pass of `scene` through `camera`.
    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<Self::Output, RenderError>;
}

/// Headless renderer producing a text description of each frame.
///
/// Useful for CLI output, logging, and testing the application loop without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    options: RendererOptions,
    size: Viewport,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new(options: RendererOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Number of completed render passes.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn set_size(&mut self, viewport: Viewport) {
        self.size = viewport;
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<String, RenderError> {
        self.frames += 1;

        let mut out = String::new();
        let p = camera.position;
        let t = camera.target;
        // Writing to a String is infallible.
        let _ = writeln!(
            out,
            "=== Frame {} ({}, alpha={}, antialias={}) ===",
            self.frames, self.size, self.options.alpha, self.options.antialias
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov_degrees, camera.aspect
        );
        let _ = writeln!(out, "Children: {}", scene.child_count());

        scene.traverse(|id, node| {
            let pos = node.transform.position;
            let detail = match &node.kind {
                NodeKind::Mesh(mesh) => format!(
                    "box {}x{}x{} color={:#08x}",
                    mesh.geometry.width,
                    mesh.geometry.height,
                    mesh.geometry.depth,
                    mesh.material.color.to_hex()
                ),
                NodeKind::AmbientLight(light) => format!(
                    "color={:#08x} intensity={}",
                    light.color.to_hex(),
                    light.intensity
                ),
                NodeKind::PointLight(light) => format!(
                    "color={:#08x} intensity={} distance={} decay={}",
                    light.color.to_hex(),
                    light.intensity,
                    light.distance,
                    light.decay
                ),
            };
            let _ = writeln!(
                out,
                "  [{id}] {} {} pos=({:.2}, {:.2}, {:.2}) {detail}",
                node.kind.label(),
                node.name,
                pos.x,
                pos.y,
                pos.z
            );
        });

        tracing::trace!(frame = self.frames, "text frame rendered");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orbitview_common::Transform;
    use orbitview_scene::{AmbientLight, BoxGeometry, LambertMaterial, Mesh, SceneNode};

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let camera = PerspectiveCamera::default();
        let mut renderer = DebugTextRenderer::default();
        let output = renderer.render(&scene, &camera).unwrap();

        assert!(output.contains("Frame 1"));
        assert!(output.contains("Children: 0"));
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn debug_renderer_lists_nodes() {
        let mut scene = Scene::new();
        scene.add(
            SceneNode::new(
                "cube",
                NodeKind::Mesh(Mesh::new(BoxGeometry::cube(5.0), LambertMaterial::default())),
            )
            .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
        );
        scene.add(SceneNode::new(
            "ambient",
            NodeKind::AmbientLight(AmbientLight::new(Color::WHITE, 0.4)),
        ));

        let mut renderer = DebugTextRenderer::new(RendererOptions::default());
        renderer.set_size(Viewport::new(800, 600));
        let output = renderer.render(&scene, &PerspectiveCamera::default()).unwrap();

        assert!(output.contains("800x600"));
        assert!(output.contains("Children: 2"));
        assert!(output.contains("mesh cube pos=(1.00, 2.00, 3.00) box 5x5x5 color=0xffffff"));
        assert!(output.contains("ambient_light ambient"));
    }

    #[test]
    fn set_size_is_reported() {
        let mut renderer = DebugTextRenderer::default();
        renderer.set_size(Viewport::new(1920, 1080));
        assert_eq!(renderer.size(), Viewport::new(1920, 1080));
    }

    #[test]
    fn clear_color_alpha() {
        let transparent = RendererOptions::default();
        assert_eq!(transparent.clear_rgba()[3], 0.0);
        let opaque = RendererOptions {
            alpha: false,
            ..RendererOptions::default()
        };
        assert_eq!(opaque.clear_rgba()[3], 1.0);
    }

    #[test]
    fn surface_errors_are_recoverable() {
        assert!(RenderError::SurfaceLost.is_recoverable());
        assert!(!RenderError::OutOfMemory.is_recoverable());
    }
}
