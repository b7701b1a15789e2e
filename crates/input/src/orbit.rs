use crate::pointer::{PointerButton, PointerEvent};
use glam::{Vec2, Vec3};
use orbitview_common::Viewport;
use orbitview_render::PerspectiveCamera;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

const POLAR_EPSILON: f32 = 1.0e-6;

/// Tuning for [`OrbitControls`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians from the +Y axis.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Idle,
    Rotate,
    Dolly,
    Pan,
}

/// Spherical coordinates around the Y axis. `phi` is the polar angle from +Y,
/// `theta` the azimuth measured from +Z towards +X.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Accumulated change for one gesture step.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrbitDelta {
    theta: f32,
    phi: f32,
    scale: f32,
    pan: Vec3,
}

impl Default for OrbitDelta {
    fn default() -> Self {
        Self {
            theta: 0.0,
            phi: 0.0,
            scale: 1.0,
            pan: Vec3::ZERO,
        }
    }
}

/// Orbit-style camera navigation around a target point.
///
/// Primary drag rotates, middle drag dollies, secondary drag pans and the
/// wheel zooms. Each gesture step updates the camera immediately; there is
/// no damping, so nothing needs to run per frame.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    target: Vec3,
    gesture: Gesture,
    last_pointer: Option<Vec2>,
}

impl OrbitControls {
    /// Bind to `camera`, orbiting around its current target.
    pub fn new(settings: OrbitSettings, camera: &mut PerspectiveCamera) -> Self {
        let mut controls = Self {
            settings,
            target: camera.target,
            gesture: Gesture::Idle,
            last_pointer: None,
        };
        controls.update(camera);
        controls
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Move the orbit center and re-aim the camera.
    pub fn set_target(&mut self, target: Vec3, camera: &mut PerspectiveCamera) {
        self.target = target;
        self.update(camera);
    }

    /// Re-apply the distance and angle limits and aim the camera at the target.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        self.apply(OrbitDelta::default(), camera);
    }

    /// Feed one pointer event. Returns `true` when the camera moved.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        camera: &mut PerspectiveCamera,
        viewport: Viewport,
    ) -> bool {
        if !self.settings.enabled {
            return false;
        }

        match event {
            PointerEvent::Pressed { button, x, y } => {
                self.gesture = match button {
                    PointerButton::Primary => Gesture::Rotate,
                    PointerButton::Middle => Gesture::Dolly,
                    PointerButton::Secondary => Gesture::Pan,
                };
                self.last_pointer = Some(Vec2::new(x, y));
                false
            }
            PointerEvent::Released { .. } | PointerEvent::Cancelled => {
                self.gesture = Gesture::Idle;
                self.last_pointer = None;
                false
            }
            PointerEvent::Moved { x, y } => {
                if self.gesture == Gesture::Idle {
                    return false;
                }
                let current = Vec2::new(x, y);
                let Some(last) = self.last_pointer.replace(current) else {
                    return false;
                };
                let delta = current - last;
                if delta == Vec2::ZERO {
                    return false;
                }
                match self.gesture {
                    Gesture::Idle => false,
                    Gesture::Rotate => self.rotate(delta, camera, viewport),
                    Gesture::Dolly => self.dolly(delta.y, camera),
                    Gesture::Pan => self.pan(delta, camera, viewport),
                }
            }
            PointerEvent::Wheel { delta_y } => {
                if delta_y == 0.0 {
                    return false;
                }
                // Scrolling up moves towards the target.
                self.dolly(-delta_y, camera)
            }
        }
    }

    fn rotate(&mut self, delta: Vec2, camera: &mut PerspectiveCamera, viewport: Viewport) -> bool {
        let height = viewport.height() as f32;
        let step = OrbitDelta {
            theta: -TAU * delta.x / height * self.settings.rotate_speed,
            phi: -TAU * delta.y / height * self.settings.rotate_speed,
            ..OrbitDelta::default()
        };
        self.apply(step, camera);
        true
    }

    /// Positive `amount` dollies in.
    fn dolly(&mut self, amount: f32, camera: &mut PerspectiveCamera) -> bool {
        let zoom = 0.95_f32.powf(self.settings.zoom_speed);
        let scale = if amount > 0.0 { zoom } else { 1.0 / zoom };
        self.apply(
            OrbitDelta {
                scale,
                ..OrbitDelta::default()
            },
            camera,
        );
        true
    }

    fn pan(&mut self, delta: Vec2, camera: &mut PerspectiveCamera, viewport: Viewport) -> bool {
        let height = viewport.height() as f32;
        let distance = (camera.position - self.target).length();
        // World units covered by the visible half-height at the target distance.
        let half_extent = distance * (camera.fov_degrees.to_radians() / 2.0).tan();
        let speed = self.settings.pan_speed;
        let left = camera.right() * (-2.0 * delta.x * half_extent / height * speed);
        let up = camera.camera_up() * (2.0 * delta.y * half_extent / height * speed);
        self.apply(
            OrbitDelta {
                pan: left + up,
                ..OrbitDelta::default()
            },
            camera,
        );
        true
    }

    fn apply(&mut self, delta: OrbitDelta, camera: &mut PerspectiveCamera) {
        let s = &self.settings;
        let offset = camera.position - self.target;
        let before = Spherical::from_offset(offset);
        let mut spherical = before;

        spherical.theta += delta.theta;
        // max/min rather than clamp: user settings may have inverted bounds.
        spherical.phi = (spherical.phi + delta.phi)
            .max(s.min_polar_angle)
            .min(s.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * delta.scale)
            .max(s.min_distance)
            .min(s.max_distance);

        // Unchanged angles and radius keep the exact offset.
        let offset = if spherical == before {
            offset
        } else {
            spherical.to_offset()
        };
        self.target += delta.pan;
        camera.set_position(self.target + offset);
        camera.look_at(self.target);
        tracing::trace!(
            radius = spherical.radius,
            phi = spherical.phi,
            theta = spherical.theta,
            "orbit camera updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (OrbitControls, PerspectiveCamera, Viewport) {
        let viewport = Viewport::new(800, 600);
        let mut camera = PerspectiveCamera::new(43.0, viewport.aspect(), 0.1, 1000.0);
        camera.set_position(Vec3::splat(20.0));
        camera.look_at(Vec3::ZERO);
        let controls = OrbitControls::new(OrbitSettings::default(), &mut camera);
        (controls, camera, viewport)
    }

    fn drag(
        controls: &mut OrbitControls,
        camera: &mut PerspectiveCamera,
        viewport: Viewport,
        button: PointerButton,
        dx: f32,
        dy: f32,
    ) {
        let (x, y) = (400.0, 300.0);
        controls.handle_event(PointerEvent::Pressed { button, x, y }, camera, viewport);
        controls.handle_event(
            PointerEvent::Moved {
                x: x + dx,
                y: y + dy,
            },
            camera,
            viewport,
        );
        controls.handle_event(PointerEvent::Released { button }, camera, viewport);
    }

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn binding_keeps_initial_pose() {
        let (controls, camera, _) = setup();
        assert_eq!(camera.position, Vec3::splat(20.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(controls.target(), Vec3::ZERO);
    }

    #[test]
    fn set_target_keeps_camera_and_reaims() {
        let (mut controls, mut camera, _) = setup();
        let target = Vec3::new(5.0, 0.0, -5.0);
        controls.set_target(target, &mut camera);
        assert_eq!(controls.target(), target);
        assert_eq!(camera.target, target);
        assert_eq!(camera.position, Vec3::splat(20.0));
    }

    #[test]
    fn spherical_round_trip() {
        let v = Vec3::new(3.0, -4.0, 12.0);
        assert_vec_close(Spherical::from_offset(v).to_offset(), v);
    }

    #[test]
    fn rotate_preserves_distance() {
        let (mut controls, mut camera, viewport) = setup();
        let before = camera.position.length();
        drag(&mut controls, &mut camera, viewport, PointerButton::Primary, 120.0, 40.0);
        assert!((camera.position.length() - before).abs() < 1e-3);
        assert!((camera.position - Vec3::splat(20.0)).length() > 1.0);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn full_height_horizontal_drag_is_one_turn() {
        let (mut controls, mut camera, viewport) = setup();
        drag(&mut controls, &mut camera, viewport, PointerButton::Primary, 600.0, 0.0);
        assert_vec_close(camera.position, Vec3::splat(20.0));
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (mut controls, mut camera, viewport) = setup();
        // Drag far downward: camera would flip over the top without clamping.
        drag(&mut controls, &mut camera, viewport, PointerButton::Primary, 0.0, 5000.0);
        let offset = camera.position - controls.target();
        assert!(offset.y > 0.0);
        assert!(offset.x.is_finite() && offset.z.is_finite());
    }

    #[test]
    fn wheel_up_dollies_in() {
        let (mut controls, mut camera, viewport) = setup();
        let before = camera.position.length();
        assert!(controls.handle_event(PointerEvent::Wheel { delta_y: -1.0 }, &mut camera, viewport));
        assert!((camera.position.length() - before * 0.95).abs() < 1e-3);

        controls.handle_event(PointerEvent::Wheel { delta_y: 1.0 }, &mut camera, viewport);
        assert!((camera.position.length() - before).abs() < 1e-3);
    }

    #[test]
    fn distance_limits_apply() {
        let (mut controls, mut camera, viewport) = setup();
        controls.settings.min_distance = 34.0;
        controls.settings.max_distance = 40.0;
        // 20 * sqrt(3) * 0.95 would be ~32.9
        controls.handle_event(PointerEvent::Wheel { delta_y: -1.0 }, &mut camera, viewport);
        assert!((camera.position.length() - 34.0).abs() < 1e-3);
    }

    #[test]
    fn middle_drag_dollies() {
        let (mut controls, mut camera, viewport) = setup();
        let before = camera.position.length();
        drag(&mut controls, &mut camera, viewport, PointerButton::Middle, 0.0, 10.0);
        assert!(camera.position.length() < before);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let (mut controls, mut camera, viewport) = setup();
        let offset_before = camera.position - controls.target();
        drag(&mut controls, &mut camera, viewport, PointerButton::Secondary, 50.0, -30.0);
        assert_ne!(controls.target(), Vec3::ZERO);
        assert_eq!(camera.target, controls.target());
        assert_vec_close(camera.position - controls.target(), offset_before);
        // Panning right moves the scene right, so the target moves left.
        assert!(controls.target().dot(camera.right()) < 0.0);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let (mut controls, mut camera, viewport) = setup();
        let moved = controls.handle_event(PointerEvent::Moved { x: 10.0, y: 10.0 }, &mut camera, viewport);
        assert!(!moved);
        assert_vec_close(camera.position, Vec3::splat(20.0));
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let (mut controls, mut camera, viewport) = setup();
        controls.settings.enabled = false;
        drag(&mut controls, &mut camera, viewport, PointerButton::Primary, 100.0, 0.0);
        assert!(!controls.handle_event(PointerEvent::Wheel { delta_y: -1.0 }, &mut camera, viewport));
        assert_vec_close(camera.position, Vec3::splat(20.0));
    }
}
