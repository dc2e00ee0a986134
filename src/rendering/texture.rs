use winit::dpi::PhysicalSize;

pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl Texture {
    pub fn from_wgpu_texture(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }
}

pub struct DepthTexture {
    texture: Texture,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, size, &label);

        DepthTexture {
            texture: Texture::from_wgpu_texture(texture),
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        label: &str,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };

        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.texture = Texture::from_wgpu_texture(Self::create_wgpu_texture(device, size, &self.label));
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }
}
