use id_arena::Id;

use crate::model::Model;
use crate::rendering::render_model::RenderModelId;

pub type SceneModelId = Id<SceneModel>;

pub struct SceneModel {
    pub model: Model,
    /// Set by the renderer once the model has been uploaded to the GPU.
    pub render_model: Option<RenderModelId>,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            render_model: None,
        }
    }
}
