use crate::config::{ConfigError, SceneConfig};
use crate::frame_loop::FrameScheduler;
use orbitview_common::{Color, NodeId, Transform, Viewport};
use orbitview_input::{OrbitControls, PointerEvent};
use orbitview_render::{DebugTextRenderer, PerspectiveCamera, RenderError, Renderer};
use orbitview_scene::{
    AmbientLight, BoxGeometry, LambertMaterial, Mesh, NodeKind, PointLight, Scene, SceneNode,
};

/// Ids of the nodes created by [`ApplicationContext::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub cube: NodeId,
    pub ambient_light: NodeId,
    pub point_light: NodeId,
}

/// Everything the application loop owns: scene, camera, renderer, controls.
///
/// All mutation goes through `&mut self`, so resize handling, pointer input
/// and frame rendering can never interleave.
pub struct ApplicationContext<R: Renderer> {
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: R,
    controls: OrbitControls,
    viewport: Viewport,
    handles: SceneHandles,
}

impl<R: Renderer> ApplicationContext<R> {
    /// Build the scene, camera and controls, and size `renderer` to `viewport`.
    pub fn initialize(
        mut renderer: R,
        viewport: Viewport,
        config: &SceneConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let cam = &config.camera;
        let mut camera = PerspectiveCamera::new(cam.fov_degrees, viewport.aspect(), cam.near, cam.far);
        camera.set_position(cam.position);
        camera.look_at(cam.target);

        renderer.set_size(viewport);

        let controls = OrbitControls::new(config.controls, &mut camera);

        let mut scene = Scene::new();
        let cube = scene.add(
            SceneNode::new(
                "cube",
                NodeKind::Mesh(Mesh::new(
                    BoxGeometry::cube(config.cube.size),
                    LambertMaterial {
                        color: Color::from_hex(config.cube.color),
                    },
                )),
            )
            .with_transform(Transform::from_position(config.cube.position)),
        );
        let ambient = &config.ambient_light;
        let ambient_light = scene.add(SceneNode::new(
            "ambient_light",
            NodeKind::AmbientLight(AmbientLight::new(
                Color::from_hex(ambient.color),
                ambient.intensity,
            )),
        ));
        let point = &config.point_light;
        let point_light = scene.add(
            SceneNode::new(
                "point_light",
                NodeKind::PointLight(
                    PointLight::new(Color::from_hex(point.color), point.intensity, point.distance)
                        .with_decay(point.decay),
                ),
            )
            .with_transform(Transform::from_position(point.position)),
        );

        for event in scene.drain_events() {
            tracing::debug!(?event, "scene bootstrap");
        }
        tracing::info!(
            %viewport,
            children = scene.child_count(),
            fov = camera.fov_degrees,
            "scene initialized"
        );

        Ok(Self {
            scene,
            camera,
            renderer,
            controls,
            viewport,
            handles: SceneHandles {
                cube,
                ambient_light,
                point_light,
            },
        })
    }

    /// Resize the render surface and keep the camera aspect in step with it.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        self.renderer.set_size(viewport);
        self.camera.aspect = viewport.aspect();
        self.camera.update_projection_matrix();
        self.viewport = viewport;
        tracing::debug!(%viewport, aspect = self.camera.aspect, "viewport resized");
    }

    /// Request the next frame from `scheduler`, then render one pass.
    ///
    /// The request is made before rendering, so a failed render still leaves
    /// the next frame scheduled.
    pub fn frame_tick<S>(&mut self, scheduler: &mut S) -> Result<R::Output, RenderError>
    where
        S: FrameScheduler + ?Sized,
    {
        scheduler.request_frame();
        self.render_frame()
    }

    /// One render pass of the scene through the camera.
    pub fn render_frame(&mut self) -> Result<R::Output, RenderError> {
        self.renderer.render(&self.scene, &self.camera)
    }

    /// Route pointer input to the orbit controls. Returns `true` when the camera moved.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.controls
            .handle_event(event, &mut self.camera, self.viewport)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn handles(&self) -> SceneHandles {
        self.handles
    }
}

impl ApplicationContext<DebugTextRenderer> {
    /// Context backed by the headless text renderer.
    pub fn headless(viewport: Viewport, config: &SceneConfig) -> Result<Self, ConfigError> {
        Self::initialize(DebugTextRenderer::new(config.renderer), viewport, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orbitview_input::PointerButton;

    #[derive(Default)]
    struct CountingScheduler {
        requests: usize,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    /// Renderer whose every pass fails.
    #[derive(Default)]
    struct BrokenRenderer {
        size: Viewport,
    }

    impl Renderer for BrokenRenderer {
        type Output = ();

        fn set_size(&mut self, viewport: Viewport) {
            self.size = viewport;
        }

        fn size(&self) -> Viewport {
            self.size
        }

        fn render(&mut self, _: &Scene, _: &PerspectiveCamera) -> Result<(), RenderError> {
            Err(RenderError::OutOfMemory)
        }
    }

    fn headless(width: u32, height: u32) -> ApplicationContext<DebugTextRenderer> {
        ApplicationContext::headless(Viewport::new(width, height), &SceneConfig::default())
            .unwrap()
    }

    #[test]
    fn startup_scene_has_one_mesh_two_lights() {
        let ctx = headless(800, 600);
        assert_eq!(ctx.scene().child_count(), 3);
        assert_eq!(ctx.scene().meshes().count(), 1);
        assert_eq!(ctx.scene().ambient_lights().count(), 1);
        assert_eq!(ctx.scene().point_lights().count(), 1);
    }

    #[test]
    fn startup_camera_pose() {
        let ctx = headless(800, 600);
        let camera = ctx.camera();
        assert_eq!(camera.position, Vec3::new(20.0, 20.0, 20.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.fov_degrees, 43.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn startup_nodes_match_stock_scene() {
        let ctx = headless(800, 600);
        let handles = ctx.handles();

        let cube = ctx.scene().get(handles.cube).unwrap();
        let NodeKind::Mesh(mesh) = cube.kind else {
            panic!("cube is not a mesh");
        };
        assert_eq!(mesh.geometry, BoxGeometry::cube(5.0));
        assert_eq!(cube.transform.position, Vec3::ZERO);

        let ambient = ctx.scene().get(handles.ambient_light).unwrap();
        assert_eq!(
            ambient.kind,
            NodeKind::AmbientLight(AmbientLight::new(Color::WHITE, 0.4))
        );

        let point = ctx.scene().get(handles.point_light).unwrap();
        assert_eq!(point.transform.position, Vec3::splat(15.0));
        let NodeKind::PointLight(light) = point.kind else {
            panic!("point light has wrong kind");
        };
        assert_eq!(light.color.to_hex(), 0x00baff);
        assert_eq!(light.intensity, 1.0);
        assert_eq!(light.distance, 100.0);
    }

    #[test]
    fn initialize_sizes_renderer() {
        let ctx = headless(800, 600);
        assert_eq!(ctx.renderer().size(), Viewport::new(800, 600));
        assert!(ctx.renderer().options().alpha);
        assert!(ctx.renderer().options().antialias);
    }

    #[test]
    fn resize_keeps_surface_and_aspect_consistent() {
        let mut ctx = headless(800, 600);
        for (w, h) in [(1, 1), (640, 480), (1920, 1080), (1080, 1920), (3840, 7), (333, 777)] {
            ctx.on_resize(w, h);
            assert_eq!(ctx.renderer().size(), Viewport::new(w, h));
            assert_eq!(ctx.camera().aspect, w as f32 / h as f32);
            assert_eq!(ctx.viewport(), Viewport::new(w, h));
        }
    }

    #[test]
    fn resize_800x600_to_1920x1080() {
        let mut ctx = headless(800, 600);
        assert!((ctx.camera().aspect - 4.0 / 3.0).abs() < 1e-6);

        ctx.on_resize(1920, 1080);
        assert!((ctx.camera().aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(ctx.renderer().size(), Viewport::new(1920, 1080));
    }

    #[test]
    fn resize_recomputes_projection() {
        let mut ctx = headless(800, 600);
        ctx.on_resize(1920, 1080);
        let expected = glam::Mat4::perspective_rh(
            43.0_f32.to_radians(),
            1920.0 / 1080.0,
            0.1,
            1000.0,
        );
        assert_eq!(ctx.camera().projection_matrix(), expected);
    }

    #[test]
    fn frame_tick_reschedules_every_frame() {
        let mut ctx = headless(800, 600);
        let mut scheduler = CountingScheduler::default();
        for n in 1..=5 {
            let output = ctx.frame_tick(&mut scheduler).unwrap();
            assert_eq!(scheduler.requests, n);
            assert_eq!(ctx.renderer().frames_rendered(), n as u64);
            assert!(output.contains("Children: 3"));
        }
    }

    #[test]
    fn frame_tick_reschedules_even_when_render_fails() {
        let mut ctx = ApplicationContext::initialize(
            BrokenRenderer::default(),
            Viewport::new(800, 600),
            &SceneConfig::default(),
        )
        .unwrap();
        let mut scheduler = CountingScheduler::default();
        assert!(ctx.frame_tick(&mut scheduler).is_err());
        assert_eq!(scheduler.requests, 1);
    }

    #[test]
    fn frame_after_resize_sees_new_dimensions() {
        let mut ctx = headless(800, 600);
        let mut scheduler = CountingScheduler::default();
        ctx.on_resize(1920, 1080);
        let output = ctx.frame_tick(&mut scheduler).unwrap();
        assert!(output.contains("1920x1080"));
        assert!(output.contains("aspect=1.778"));
    }

    #[test]
    fn pointer_drag_orbits_camera() {
        let mut ctx = headless(800, 600);
        let distance = ctx.camera().position.length();
        ctx.handle_pointer(PointerEvent::Pressed {
            button: PointerButton::Primary,
            x: 100.0,
            y: 100.0,
        });
        assert!(ctx.handle_pointer(PointerEvent::Moved { x: 160.0, y: 100.0 }));
        assert!((ctx.camera().position.length() - distance).abs() < 1e-3);
        assert!((ctx.camera().position - Vec3::splat(20.0)).length() > 1.0);
        assert_eq!(ctx.controls().target(), Vec3::ZERO);
        assert_eq!(ctx.camera().target, Vec3::ZERO);
    }

    #[test]
    fn bootstrap_events_are_drained() {
        let ctx = headless(800, 600);
        assert!(ctx.scene().events().is_empty());
        assert_eq!(ctx.scene().child_count(), 3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SceneConfig::default();
        config.camera.near = 0.0;
        let result = ApplicationContext::headless(Viewport::new(800, 600), &config);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
