use id_arena::Id;

use crate::config::LightingConfig;
use crate::scene_graph::color::Color;

pub type LightId = Id<HemisphereLight>;

/// Ambient light blended between a sky color (surfaces facing +Y) and a ground color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
}

impl HemisphereLight {
    pub fn new(sky_color: Color, ground_color: Color, intensity: f32) -> Self {
        Self {
            sky_color,
            ground_color,
            intensity,
        }
    }

    pub fn from_config(config: &LightingConfig) -> Self {
        Self::new(config.sky_color, config.ground_color, config.intensity)
    }
}
