use anyhow::Result;
use clap::Parser;
use orbitview_app::{ApplicationContext, CancellationToken, FrameLoop, FrameScheduler, SceneConfig};
use orbitview_common::Viewport;
use orbitview_input::{PointerButton, PointerEvent};
use orbitview_render_wgpu::SurfaceRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "orbitview-desktop", about = "Orbit camera cube scene in a native window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial window width in physical pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value = "720")]
    height: u32,
}

/// Display-refresh scheduling through winit redraw requests.
struct RedrawScheduler<'a>(&'a Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

struct DesktopApp {
    config: SceneConfig,
    initial_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    context: Option<ApplicationContext<SurfaceRenderer>>,
    frame_loop: FrameLoop,
    cursor: (f32, f32),
    fatal: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: SceneConfig, initial_size: PhysicalSize<u32>, token: CancellationToken) -> Self {
        Self {
            config,
            initial_size,
            window: None,
            context: None,
            frame_loop: FrameLoop::new(token),
            cursor: (0.0, 0.0),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.fatal = Some(error);
        self.frame_loop.token().cancel();
        event_loop.exit();
    }

    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("orbitview")
            .with_transparent(self.config.renderer.alpha)
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height);
        let renderer = SurfaceRenderer::new(window.clone(), viewport, self.config.renderer)?;
        window.set_title(&format!(
            "orbitview ({})",
            renderer.adapter_info().backend.to_str()
        ));
        let context = ApplicationContext::initialize(renderer, viewport, &self.config)?;

        // First frame; every frame after this reschedules itself.
        window.request_redraw();

        self.window = Some(window);
        self.context = Some(context);
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let (Some(context), Some(window)) = (&mut self.context, &self.window) {
            if context.handle_pointer(event) {
                window.request_redraw();
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(context), Some(window)) = (&mut self.context, &self.window) else {
            return;
        };

        match self.frame_loop.tick(context, &mut RedrawScheduler(window)) {
            Ok(Some(())) => {}
            Ok(None) => event_loop.exit(),
            Err(e) if e.is_recoverable() => tracing::warn!("skipping frame: {e}"),
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.setup(event_loop) {
            self.fail(event_loop, e);
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
                self.frame_loop.token().cancel();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                tracing::info!("escape pressed, stopping");
                self.frame_loop.token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.context {
                    context.on_resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                let (x, y) = self.cursor;
                self.pointer(PointerEvent::Moved { x, y });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = pointer_button(button) else {
                    return;
                };
                let (x, y) = self.cursor;
                let event = match state {
                    ElementState::Pressed => PointerEvent::Pressed { button, x, y },
                    ElementState::Released => PointerEvent::Released { button },
                };
                self.pointer(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive; pointer events use negative.
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
                };
                self.pointer(PointerEvent::Wheel { delta_y });
            }
            WindowEvent::Focused(false) => {
                self.pointer(PointerEvent::Cancelled);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("orbitview-desktop starting");

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(
        config,
        PhysicalSize::new(cli.width, cli.height),
        CancellationToken::new(),
    );
    event_loop.run_app(&mut app)?;

    if let Some(error) = app.fatal.take() {
        return Err(error);
    }
    tracing::info!(frames = app.frame_loop.frames(), "orbitview-desktop stopped");
    Ok(())
}
