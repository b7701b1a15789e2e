use crate::gpu::MeshRenderer;
use orbitview_common::Viewport;
use orbitview_render::{PerspectiveCamera, RenderError, Renderer, RendererOptions};
use orbitview_scene::Scene;

const MSAA_SAMPLES: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum GpuInitError {
    #[error("failed to create render surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
}

/// Renderer drawing into a window surface.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    meshes: MeshRenderer,
    adapter_info: wgpu::AdapterInfo,
}

impl SurfaceRenderer {
    /// Create a GPU device and a surface for `target` (typically an `Arc<Window>`).
    pub fn new<W>(
        target: W,
        viewport: Viewport,
        options: RendererOptions,
    ) -> Result<Self, GpuInitError>
    where
        W: wgpu::WindowHandle + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(GpuInitError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbitview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or(GpuInitError::UnsupportedSurface)?;

        let alpha_mode = if options.alpha
            && caps
                .alpha_modes
                .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let sample_count = if options.antialias
            && adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            1
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width(),
            height: viewport.height(),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let meshes = MeshRenderer::new(&device, format, viewport, sample_count, &options);
        let adapter_info = adapter.get_info();

        tracing::info!(
            backend = adapter_info.backend.to_str(),
            adapter = %adapter_info.name,
            ?format,
            ?alpha_mode,
            sample_count,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            meshes,
            adapter_info,
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl Renderer for SurfaceRenderer {
    type Output = ();

    fn set_size(&mut self, viewport: Viewport) {
        self.config.width = viewport.width();
        self.config.height = viewport.height();
        self.reconfigure();
        self.meshes.resize(&self.device, viewport);
    }

    fn size(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(RenderError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            #[allow(unreachable_patterns)]
            Err(e) => return Err(RenderError::Backend(e.to_string())),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.meshes
            .render(&self.device, &self.queue, &view, scene, camera);
        output.present();
        tracing::trace!("frame presented");
        Ok(())
    }
}
