use id_arena::Arena;
use wgpu::BufferUsages;

use crate::model::Instance;
use crate::rendering::render_model::RenderModel;
use crate::scene_graph::scene::Scene;

pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue, instance_buffer: &InstanceBuffer) {
        let count = self.instances.len().min(InstanceBuffer::MAX_INSTANCES as usize);
        if count < self.instances.len() {
            log::warn!(
                "Dropping {} instances over the buffer limit",
                self.instances.len() - count
            );
        }

        queue.write_buffer(
            instance_buffer.buffer(),
            0,
            bytemuck::cast_slice(&self.instances[..count]),
        );
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len().min(InstanceBuffer::MAX_INSTANCES as usize)
    }
}

pub struct InstanceBuffer(wgpu::Buffer);

impl InstanceBuffer {
    const MAX_INSTANCES: u64 = 128;

    pub fn new(device: &wgpu::Device, name: &str) -> Self {
        let label = format!("Instance buffer ({})", name);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size: std::mem::size_of::<Instance>() as u64 * Self::MAX_INSTANCES,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self(buffer)
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer().slice(..));
    }
}

/// Rebuilds per-model instance lists from the objects currently attached to the scene.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
    }

    for (_, object) in scene.children() {
        let Some(render_model_id) = object
            .model_id
            .and_then(|model_id| scene.models.get(model_id))
            .and_then(|scene_model| scene_model.render_model)
        else {
            continue;
        };

        if let Some(render_model) = render_models.get_mut(render_model_id) {
            render_model.instances.add(Instance {
                model: object.transform.matrix(),
            });
        }
    }
}
