use std::{
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::{PollType, RenderPipeline};

type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub(crate) struct ShaderDefinition {
    pub name: &'static str,
    pub path: &'static str,
}

pub struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<wgpu::RenderPipeline>);

pub struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self {
            shaders: Arena::new(),
            pipelines: Arena::new(),
        }
    }

    pub(crate) fn add_shader(
        &mut self,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def: shader_def,
            factory,
        });
        pipeline_id
    }

    fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    /// `None` only if the pipeline failed to compile and was never replaced.
    pub fn get(&self, id: PipelineId) -> Option<&RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }
}

/// Compiles every registered shader at startup and, when enabled, recompiles
/// a shader on a watcher thread whenever its file changes on disk.
pub(crate) struct ShaderLoader {
    pub cache: PipelineCache,
    receiver: mpsc::Receiver<(&'static str, PipelineId, wgpu::RenderPipeline)>,
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl ShaderLoader {
    pub fn new(
        device: wgpu::Device,
        shader_folder: &Path,
        cache_builder: PipelineCacheBuilder,
        hot_reload: bool,
    ) -> anyhow::Result<Self> {
        let mut cache = cache_builder.build();
        let shader_folder = shader_folder
            .canonicalize()
            .with_context(|| format!("Shader folder {} not found", shader_folder.display()))?;

        for (_, shader) in cache.shaders.clone().iter() {
            let pipeline = compile_file(&device, &shader_folder, &shader.def, &shader.factory)
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;
            if let Some(entry) = cache.pipelines.get_mut(shader.pipeline_id) {
                entry.0 = Some(pipeline);
            }
        }

        let (send_new_pipelines, recv_new_pipelines) = channel();

        let debouncer = if hot_reload {
            let shaders = cache.shaders.clone();
            let watched_folder = shader_folder.clone();

            let mut debouncer = new_debouncer_opt::<_, RecommendedWatcher>(
                notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
                move |res: DebounceEventResult| match res {
                    Ok(events) => {
                        for event in events {
                            if event.kind != DebouncedEventKind::Any {
                                continue;
                            }

                            let Some(entry) = shaders
                                .iter()
                                .map(|(_, entry)| entry)
                                .find(|entry| event.path.ends_with(entry.def.path))
                            else {
                                continue;
                            };

                            match compile_file(&device, &watched_folder, &entry.def, &entry.factory)
                            {
                                Ok(pipeline) => {
                                    if send_new_pipelines
                                        .send((entry.def.name, entry.pipeline_id, pipeline))
                                        .is_err()
                                    {
                                        return;
                                    }
                                }
                                Err(e) => log::error!("Failed to reload shader: {:#}", e),
                            }
                        }
                    }
                    Err(e) => log::error!("Error debouncing shader changes: {}", e),
                },
            )
            .context("Failed to create shader watcher")?;

            debouncer
                .watcher()
                .watch(&shader_folder, RecursiveMode::Recursive)
                .context("Failed to watch shader folder")?;

            Some(debouncer)
        } else {
            None
        };

        Ok(Self {
            cache,
            receiver: recv_new_pipelines,
            _debouncer: debouncer,
        })
    }

    pub(crate) fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            if let Some(entry) = self.cache.pipelines.get_mut(pipeline_id) {
                log::info!("Shader reloaded: {}", name);
                entry.0 = Some(pipeline);
            }
        }
    }
}

fn compile_file(
    device: &wgpu::Device,
    shader_folder: &Path,
    shader_def: &ShaderDefinition,
    factory: &PipelineFactory,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let path: PathBuf = shader_folder.join(shader_def.path);
    let shader_code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, &shader_code);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation.")?;

    let error = block_on(device.pop_error_scope());

    if let Some(error) = error {
        return Err(anyhow::anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    };

    pipeline
}
