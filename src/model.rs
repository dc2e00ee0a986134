use std::path::Path;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use gltf::buffer;
use itertools::izip;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
}

#[derive(Debug)]
pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Triangle geometry of a glTF scene, with node transforms baked into the vertices.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn load(path: &Path) -> anyhow::Result<Model> {
        let (document, buffers, _images) = gltf::import(path)
            .with_context(|| format!("Failed to import glTF file {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unnamed".to_string());

        Self::from_gltf(name, &document, &buffers)
    }

    pub fn from_gltf(
        name: impl Into<String>,
        document: &gltf::Document,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("No scenes in glTF document")?;

        for node in scene.nodes() {
            model.add_node(&node, buffers, Mat4::IDENTITY)?;
        }

        if model.primitives.is_empty() {
            return Err(anyhow::anyhow!("Scene without meshes: {}", model.name));
        }

        Ok(model)
    }

    fn add_node(
        &mut self,
        node: &gltf::Node,
        buffers: Buffers,
        parent_transform: Mat4,
    ) -> anyhow::Result<()> {
        let transform = parent_transform * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                self.add_primitive(&primitive, buffers, transform)?;
            }
        }

        for child in node.children() {
            self.add_node(&child, buffers, transform)?;
        }

        Ok(())
    }

    fn add_primitive(
        &mut self,
        primitive: &gltf::Primitive,
        buffers: Buffers,
        transform: Mat4,
    ) -> anyhow::Result<()> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            return Err(anyhow::anyhow!(
                "Unsupported primitive mode: {:?}",
                primitive.mode()
            ));
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let position_reader = reader
            .read_positions()
            .with_context(|| format!("Primitive without positions in {}", self.name))?;
        let normal_reader = reader
            .read_normals()
            .with_context(|| format!("Primitive without normals in {}", self.name))?;

        let [r, g, b, _] = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();
        let color = Vec3::new(r, g, b);

        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

        let vertices = izip!(position_reader, normal_reader)
            .map(|(position, normal)| Vertex {
                position: transform.transform_point3(Vec3::from(position)),
                normal: (normal_matrix * Vec3::from(normal)).normalize_or_zero(),
                color,
            })
            .collect::<Vec<Vertex>>();

        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
            None => (0..vertices.len() as u32).collect(),
        };

        self.primitives.push(ModelPrimitive {
            index: self.primitives.len(),
            vertices,
            indices,
        });

        Ok(())
    }

    #[cfg(test)]
    pub fn test_triangle() -> Model {
        let vertex = |x: f32, y: f32| Vertex {
            position: Vec3::new(x, y, 0.0),
            normal: Vec3::Z,
            color: Vec3::ONE,
        };

        Model {
            name: "Triangle".to_string(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
                indices: vec![0, 1, 2],
            }],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model: Mat4,
}

impl Instance {
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}
