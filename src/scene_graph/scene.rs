use id_arena::Arena;

use crate::model::Model;
use crate::scene_graph::color::Color;
use crate::scene_graph::light::{HemisphereLight, LightId};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};

/// Flat scene graph. Objects and lights live in arenas for the whole program
/// run; adding attaches them, removing only detaches.
pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    pub lights: Arena<HemisphereLight>,
    children: Vec<ObjectId>,
    light_ids: Vec<LightId>,
    background: Color,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            lights: Arena::new(),
            children: Vec::new(),
            light_ids: Vec::new(),
            background,
        }
    }

    pub fn add_model(&mut self, model: Model) -> SceneModelId {
        self.models.alloc(SceneModel::new(model))
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        log::debug!("Attaching {}", object.name);
        let id = self.objects.alloc(object);
        self.children.push(id);
        id
    }

    /// Wraps `model` in a new object scaled uniformly by `scale` and attaches it.
    pub fn spawn_model(&mut self, name: &str, model: Model, scale: f32) -> ObjectId {
        let model_id = self.add_model(model);
        let mut object = Object3D::with_model(name, model_id);
        object.transform.set_scale(scale);
        self.add_object(object)
    }

    pub fn remove(&mut self, id: ObjectId) {
        self.children.retain(|&child| child != id);
    }

    #[allow(dead_code)]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.children.contains(&id)
    }

    #[allow(dead_code)]
    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    /// Attached objects in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> + '_ {
        self.children
            .iter()
            .filter_map(move |&id| self.objects.get(id).map(|object| (id, object)))
    }

    pub fn add_light(&mut self, light: HemisphereLight) -> LightId {
        let id = self.lights.alloc(light);
        self.light_ids.push(id);
        id
    }

    pub fn remove_light(&mut self, id: LightId) {
        self.light_ids.retain(|&light| light != id);
    }

    pub fn attached_lights(&self) -> impl Iterator<Item = &HemisphereLight> + '_ {
        self.light_ids
            .iter()
            .filter_map(move |&id| self.lights.get(id))
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }
}
