use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    assets::GltfFileSource,
    config::{DemoConfig, RenderConfig},
    demo::DemoState,
    rendering::renderer::Renderer,
};

struct App {
    config: RenderConfig,
    renderer: Option<Renderer>,
    demo_state: DemoState,
}

impl App {
    fn new(config: RenderConfig, demo_state: DemoState) -> Self {
        Self {
            config,
            renderer: None,
            demo_state,
        }
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Renderer> {
        let (width, height) = self.config.window_size;
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let size = window.inner_size();
        self.demo_state.set_viewport(size.width, size.height);

        pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.demo_state,
            &self.config,
        ))
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        self.demo_state.update();

        match renderer.render(&mut self.demo_state) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }

        renderer.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(e) => {
                log::error!("Failed to initialise renderer: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.demo_state
                    .controls
                    .on_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.demo_state.controls.on_mouse_button(button, state);

                // A click is a completed primary-button press, drag or not.
                if button == MouseButton::Left && state == ElementState::Released {
                    self.demo_state.explode();
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.demo_state.controls.on_scroll(delta);
            }
            _ => (),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;

    let mut demo_state = DemoState::new(DemoConfig::default(), Arc::new(GltfFileSource));
    demo_state.load_main_cube();

    let mut app = App::new(RenderConfig::default(), demo_state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
