use glam::Vec3;
use id_arena::Id;

use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
}

impl Object3D {
    pub fn with_model(name: impl Into<String>, model_id: SceneModelId) -> Self {
        Self {
            name: name.into(),
            model_id: Some(model_id),
            ..Default::default()
        }
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            model_id: None,
        }
    }
}
