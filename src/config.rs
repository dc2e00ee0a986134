use std::path::PathBuf;

use glam::Vec3;

use crate::scene_graph::color::Color;

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            eye: Vec3::new(0.0, 0.0, 35.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingConfig {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
    pub background: Color,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub object_path: PathBuf,
    pub main_scale: f32,
    pub fragment_scale: f32,
    pub fragment_count: usize,
    /// Upper bound of the random jitter added to each fragment coordinate.
    pub spread_distance: f32,
    /// Per-frame rotation of the main cube. Fragments use `fragment_rotation_speed`.
    pub rotation_speed: Vec3,
    pub fragment_rotation_speed: Vec3,
    pub camera: CameraConfig,
    pub initial_lighting: LightingConfig,
    pub exploded_lighting: LightingConfig,
}

impl DemoConfig {
    /// Half extent shared by all fragments, derived from how many pieces the cube splits into.
    pub fn fragment_size(&self) -> f32 {
        15.0 / (self.fragment_count as f32).sqrt()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        let rotation_speed = 0.01;
        let fragment_rotation_speed = 0.005;

        Self {
            object_path: PathBuf::from("./assets/objects/cube.glb"),
            main_scale: 7.0,
            fragment_scale: 2.0,
            fragment_count: 8,
            spread_distance: 5.0,
            rotation_speed: Vec3::new(rotation_speed, rotation_speed * 0.5, rotation_speed),
            fragment_rotation_speed: Vec3::new(
                fragment_rotation_speed,
                fragment_rotation_speed * 0.5,
                fragment_rotation_speed,
            ),
            camera: CameraConfig::default(),
            initial_lighting: LightingConfig {
                sky_color: Color::from_rgb8(150, 150, 150),
                ground_color: Color::BLACK,
                intensity: 1.0,
                background: Color::WHITE,
            },
            exploded_lighting: LightingConfig {
                sky_color: Color::WHITE,
                ground_color: Color::BLACK,
                intensity: 1.0,
                background: Color::BLACK,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    pub shader_folder: PathBuf,
    pub hot_reload_shaders: bool,
    pub present_mode: wgpu::PresentMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_title: "Exploding Cube".to_string(),
            window_size: (1280, 720),
            shader_folder: PathBuf::from("assets/shaders"),
            hot_reload_shaders: true,
            present_mode: wgpu::PresentMode::AutoVsync,
        }
    }
}
