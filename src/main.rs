use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use blackhole_viewer::app::print_summary;
use blackhole_viewer::{
    FrameLoop, PointerButton, PointerEvent, Renderer, ViewerConfig, Viewport,
};

/// Pixel-based wheel deltas are converted to notches at this rate.
const PIXELS_PER_NOTCH: f64 = 100.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.tuning {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load tuning file {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    if options.summary_only {
        print_summary(&config);
        return Ok(());
    }
    run_interactive(config)
}

fn run_interactive(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Black Hole")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let frame_loop = FrameLoop::new(&config, viewport_of(&window));
    let extent = frame_loop.extent();
    let renderer = block_on(Renderer::new(Arc::clone(&window), &config, extent))
        .context("failed to initialize GPU renderer")?;
    info!(
        "rendering at {}x{} (window {}x{})",
        extent.width,
        extent.height,
        window.inner_size().width,
        window.inner_size().height
    );

    let mut app = AppState {
        renderer,
        frame_loop,
        last_error: None,
    };

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            if let Err(err) = app.process_event(&event, elwt) {
                app.last_error = Some(err);
                elwt.exit();
            }
        })
        .context("event loop terminated abnormally")?;

    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn viewport_of(window: &Window) -> Viewport {
    let size = window.inner_size();
    Viewport::new(size.width, size.height, window.scale_factor())
}

struct AppState {
    renderer: Renderer,
    frame_loop: FrameLoop,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        elwt.exit();
                    }
                    WindowEvent::Resized(size) => {
                        let scale_factor = self.renderer.window().scale_factor();
                        let viewport = Viewport::new(size.width, size.height, scale_factor);
                        self.frame_loop.resize(viewport, &mut self.renderer);
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let viewport = viewport_of(self.renderer.window());
                        self.frame_loop.resize(viewport, &mut self.renderer);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        let button = map_button(*button);
                        self.frame_loop.handle_pointer(match state {
                            ElementState::Pressed => PointerEvent::Pressed(button),
                            ElementState::Released => PointerEvent::Released(button),
                        });
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let position = Vec2::new(position.x as f32, position.y as f32);
                        self.frame_loop
                            .handle_pointer(PointerEvent::Moved(position));
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let notches = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(position) => {
                                (position.y / PIXELS_PER_NOTCH) as f32
                            }
                        };
                        self.frame_loop
                            .handle_pointer(PointerEvent::Scroll(notches));
                    }
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        match self.frame_loop.tick(&mut self.renderer) {
            Ok(_) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.renderer.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; skipping frame");
                Ok(())
            }
            Err(err) => Err(err).context("failed to present frame"),
        }
    }
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(value) => PointerButton::Other(value),
    }
}

struct CliOptions {
    tuning: Option<PathBuf>,
    summary_only: bool,
}

impl CliOptions {
    const USAGE: &'static str = "Usage: blackhole-viewer [--tuning <file.xml>] [--summary-only]";

    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut tuning = None;
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--tuning" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--tuning expects a file path. {}", Self::USAGE))?;
                    tuning = Some(PathBuf::from(path));
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {}", Self::USAGE));
                }
            }
        }
        Ok(Self {
            tuning,
            summary_only,
        })
    }
}
