use std::sync::Arc;

use wgpu::{RenderPass, RenderPassDescriptor};

use crate::rendering::{
    passes::pass::Pass,
    render_common::RenderCommon,
    shader_loader::{PipelineCache, PipelineCacheBuilder},
};

/// Clears the frame to the scene background and resets depth.
pub struct BackgroundPass;

pub struct BackgroundPassTarget {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    pub background: wgpu::Color,
}

impl Pass for BackgroundPass {
    type Target = BackgroundPassTarget;

    fn create(
        _device: &wgpu::Device,
        _common: Arc<RenderCommon>,
        _cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<BackgroundPass> {
        Ok(BackgroundPass)
    }

    fn render<'a, F>(
        &self,
        target: &Self::Target,
        encoder: &mut wgpu::CommandEncoder,
        _pipeline_cache: &PipelineCache,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a,
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Background Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(target.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_callback(&mut render_pass);
    }
}
