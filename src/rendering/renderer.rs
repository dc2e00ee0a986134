use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::CameraUniform,
    config::RenderConfig,
    demo::DemoState,
    rendering::{
        global_uniform::GlobalUniformState,
        instance::gather_instances,
        passes::{
            background_pass::{BackgroundPass, BackgroundPassTarget},
            model_pass::{ModelPass, ModelPassTarget},
            pass::Pass,
        },
        render_common::RenderCommon,
        render_model::{render_model_instances, RenderModel},
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,

    camera_uniform: CameraUniform,

    shader_loader: ShaderLoader,

    background_pass: BackgroundPass,
    model_pass: ModelPass,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        demo_state: &DemoState,
        config: &RenderConfig,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let mut camera_uniform = CameraUniform::default();
        camera_uniform.update(&demo_state.camera);
        let camera_buffer = camera_uniform.create_buffer(&device);

        let common = RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            config.present_mode,
            camera_buffer,
        )?;
        let common = Arc::new(common);

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let mut cache_builder = PipelineCacheBuilder::new();

        let background_pass = BackgroundPass::create(&device, common.clone(), &mut cache_builder)?;
        let model_pass = ModelPass::create(&device, common.clone(), &mut cache_builder)?;

        let shader_loader = ShaderLoader::new(
            device.clone(),
            &config.shader_folder,
            cache_builder,
            config.hot_reload_shaders,
        )?;

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: Arena::new(),
            camera_uniform,
            shader_loader,
            background_pass,
            model_pass,
        })
    }

    /// Uploads scene models that have not been seen by the GPU yet.
    pub fn sync_models(&mut self, demo_state: &mut DemoState) {
        for (_id, scene_model) in demo_state.scene.models.iter_mut() {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            scene_model.render_model = Some(self.render_models.alloc(render_model));

            log::debug!(
                "Uploaded model {} with {} primitives",
                scene_model.model.name,
                scene_model.model.primitives.len()
            );
        }
    }

    /// Reconfigures the surface for a new window size. The camera keeps its aspect.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.depth_texture.resize(&self.device, new_size);

        let mut config = match self.common.output_surface_config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
    }

    pub fn render(&mut self, demo_state: &mut DemoState) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();
        self.sync_models(demo_state);

        self.camera_uniform.update(&demo_state.camera);
        self.camera_uniform
            .update_buffer(&self.queue, &self.common.camera_uniform_buffer);
        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(demo_state.scene.attached_lights().next()),
        );

        gather_instances(&demo_state.scene, &mut self.render_models);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let pipeline_cache = &self.shader_loader.cache;

        self.background_pass.render(
            &BackgroundPassTarget {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
                background: demo_state.scene.background().to_wgpu(),
            },
            &mut encoder,
            pipeline_cache,
            |_| {},
        );

        self.model_pass.render(
            &ModelPassTarget {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                for (_id, render_model) in self.render_models.iter() {
                    if !render_model.instances.should_render() {
                        continue;
                    }

                    render_model_instances(render_pass, &self.queue, render_model);
                }
            },
        );

        self.queue.submit([encoder.finish()]);

        self.window.pre_present_notify();
        output.present();

        Ok(())
    }
}
