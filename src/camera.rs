use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::config::CameraConfig;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn perspective(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            up: Vec3::Y,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn get_vp_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
}

impl CameraUniform {
    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.get_vp_matrix();
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::perspective(&CameraConfig::default(), 16.0 / 9.0);
        let clip = camera.get_vp_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn defaults_match_demo_camera() {
        let camera = Camera::perspective(&CameraConfig::default(), 1.0);
        assert_eq!(camera.eye, Vec3::new(0.0, 0.0, 35.0));
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }
}
