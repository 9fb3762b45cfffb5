use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::config::ViewerConfig;
use crate::frame::FrameTarget;
use crate::resize::TargetExtent;
use crate::uniforms::UniformFrame;

use super::graph::RenderGraph;

/// Owns the window surface and GPU device and drives the [`RenderGraph`].
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    graph: RenderGraph,
}

impl Renderer {
    /// Initializes the GPU for `window`, with offscreen targets at `extent`.
    pub async fn new(
        window: Arc<Window>,
        viewer: &ViewerConfig,
        extent: TargetExtent,
    ) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        let adapter_info = adapter.get_info();
        info!(
            "using {} ({:?} backend)",
            adapter_info.name, adapter_info.backend
        );

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("viewer-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        info!(
            "surface {}x{} {:?}, vsync",
            config.width, config.height, config.format
        );

        let graph = RenderGraph::new(
            &device,
            &queue,
            surface_format,
            extent,
            viewer.bloom,
            viewer.display,
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            graph,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Matches the swap chain to the window's current physical size.
    pub fn reconfigure(&mut self) {
        let size = self.window.inner_size();
        self.configure_surface(size, true);
    }

    fn configure_surface(&mut self, size: PhysicalSize<u32>, force: bool) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if !force && size.width == self.config.width && size.height == self.config.height {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        debug!("surface configured to {}x{}", size.width, size.height);
    }
}

impl FrameTarget for Renderer {
    type Error = wgpu::SurfaceError;

    fn resize(&mut self, extent: TargetExtent) {
        let size = self.window.inner_size();
        self.configure_surface(size, false);
        self.graph.resize(&self.device, &self.queue, extent);
    }

    fn draw(&mut self, frame: &UniformFrame) -> Result<(), Self::Error> {
        let size = self.window.inner_size();
        self.configure_surface(size, false);

        self.graph.write_frame(&self.queue, frame);
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        self.graph.encode(&mut encoder, &view);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
