use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

use crate::camera::Camera;

const MIN_POLAR_ANGLE: f32 = 1e-6;
const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

/// Orbits the camera around a target point. Input handlers only accumulate
/// deltas; `update` applies them to the camera once per frame.
#[derive(Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    viewport_height: f32,
    drag: Option<DragMode>,
    cursor: Option<Vec2>,
    rotate_delta: Vec2,
    pan_delta: Vec2,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            viewport_height: 1.0,
            drag: None,
            cursor: None,
            rotate_delta: Vec2::ZERO,
            pan_delta: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let mode = match button {
            MouseButton::Left => DragMode::Rotate,
            MouseButton::Right | MouseButton::Middle => DragMode::Pan,
            _ => return,
        };

        match state {
            ElementState::Pressed => self.drag = Some(mode),
            ElementState::Released if self.drag == Some(mode) => self.drag = None,
            ElementState::Released => {}
        }
    }

    pub fn on_cursor_moved(&mut self, position: Vec2) {
        if let (Some(mode), Some(last)) = (self.drag, self.cursor) {
            let delta = position - last;
            match mode {
                DragMode::Rotate => self.rotate_delta += delta,
                DragMode::Pan => self.pan_delta += delta,
            }
        }

        self.cursor = Some(position);
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };

        // Scrolling up dollies in.
        self.scale *= 0.95f32.powf(self.zoom_speed * lines);
    }

    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.eye - self.target;
        let radius = offset.length();

        if radius > 0.0 {
            let height = self.viewport_height;
            let mut theta = offset.x.atan2(offset.z);
            let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

            theta -= 2.0 * PI * self.rotate_delta.x / height * self.rotate_speed;
            phi -= 2.0 * PI * self.rotate_delta.y / height * self.rotate_speed;
            phi = phi.clamp(MIN_POLAR_ANGLE, PI - MIN_POLAR_ANGLE);

            if self.pan_delta != Vec2::ZERO {
                let forward = -offset / radius;
                let right = forward.cross(camera.up).normalize_or_zero();
                let up = right.cross(forward);
                let target_distance = radius * (camera.fov_y / 2.0).tan();
                let pixels_to_world = 2.0 * target_distance / height * self.pan_speed;

                self.target += (-right * self.pan_delta.x + up * self.pan_delta.y) * pixels_to_world;
            }

            let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
            let offset = Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );

            camera.eye = self.target + offset;
            camera.target = self.target;
        }

        self.rotate_delta = Vec2::ZERO;
        self.pan_delta = Vec2::ZERO;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    fn setup() -> (OrbitControls, Camera) {
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.set_viewport_height(720.0);
        (controls, Camera::perspective(&CameraConfig::default(), 16.0 / 9.0))
    }

    fn drag(controls: &mut OrbitControls, button: MouseButton, from: Vec2, to: Vec2) {
        controls.on_cursor_moved(from);
        controls.on_mouse_button(button, ElementState::Pressed);
        controls.on_cursor_moved(to);
        controls.on_mouse_button(button, ElementState::Released);
    }

    #[test]
    fn idle_update_keeps_camera() {
        let (mut controls, mut camera) = setup();
        controls.update(&mut camera);

        assert!((camera.eye - Vec3::new(0.0, 0.0, 35.0)).length() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn rotating_keeps_distance_to_target() {
        let (mut controls, mut camera) = setup();
        drag(&mut controls, MouseButton::Left, Vec2::new(100.0, 100.0), Vec2::new(250.0, 40.0));
        controls.update(&mut camera);

        assert!((camera.eye.length() - 35.0).abs() < 1e-3);
        assert!(camera.eye.x.abs() > 1.0);
        assert!(camera.eye.y.abs() > 1.0);
    }

    #[test]
    fn moving_without_button_does_nothing() {
        let (mut controls, mut camera) = setup();
        controls.on_cursor_moved(Vec2::new(0.0, 0.0));
        controls.on_cursor_moved(Vec2::new(300.0, 300.0));
        controls.update(&mut camera);

        assert!((camera.eye - Vec3::new(0.0, 0.0, 35.0)).length() < 1e-4);
    }

    #[test]
    fn scrolling_up_dollies_in() {
        let (mut controls, mut camera) = setup();
        controls.on_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        controls.update(&mut camera);

        let expected = 35.0 * 0.95f32.powi(2);
        assert!((camera.eye.length() - expected).abs() < 1e-3);
    }

    #[test]
    fn panning_moves_target_and_eye_together() {
        let (mut controls, mut camera) = setup();
        drag(&mut controls, MouseButton::Right, Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        controls.update(&mut camera);

        assert!(controls.target.x < 0.0);
        assert!((camera.eye - camera.target - Vec3::new(0.0, 0.0, 35.0)).length() < 1e-3);
    }
}
