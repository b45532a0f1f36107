//! Frame driver: window, event loop and the per-frame update call.
//!
//! [`run`] opens a window, creates the GPU [`Context`] on a tokio runtime
//! and hands an [`Application`] the context, a [`World`] and the current
//! [`Input`] once per frame.
//!
//! # Lifecycle
//!
//! 1. `initialize()` is awaited once, after the window and device exist
//! 2. window and device events are folded into [`Input`]
//! 3. each redraw acquires the frame, calls `update()` and presents
//! 4. the loop ends on a close request, Escape, or an error from the
//!    application, which [`run`] returns

use std::sync::Arc;

use anyhow::Result;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    context::{Context, FrameError},
    input::Input,
    render::World,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    /// Inner size in physical pixels.
    pub size: [u32; 2],
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "lumen-ngin".to_string(),
            size: [800, 600],
        }
    }
}

/// A program driven by [`run`].
pub trait Application {
    /// Builds the scene. Called once before the first frame.
    fn initialize(
        &mut self,
        ctx: &Context,
        world: &mut World,
    ) -> impl Future<Output = Result<()>>;

    /// Advances the simulation by `dt` seconds and draws the frame.
    ///
    /// The screen frame is already acquired, so renders may target
    /// [`Destination::Screen`](crate::render::Destination::Screen).
    fn update(&mut self, ctx: &Context, world: &mut World, input: &Input, dt: f32) -> Result<()>;

    /// Called after the window, and with it the screen, changed size.
    fn resized(&mut self, _ctx: &Context, _world: &mut World) {}
}

struct Running {
    window: Arc<Window>,
    ctx: Context,
    world: World,
}

struct Driver<A> {
    runtime: tokio::runtime::Runtime,
    settings: WindowSettings,
    app: A,
    running: Option<Running>,
    input: Input,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl<A: Application> Driver<A> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let [width, height] = self.settings.size;
        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let mut ctx = self.runtime.block_on(Context::new(window.clone()))?;
        let size = window.inner_size();
        ctx.resize(size.width, size.height);
        let mut world = World::new();
        self.runtime
            .block_on(self.app.initialize(&ctx, &mut world))?;
        Ok(Running { window, ctx, world })
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let dt = self.last_time.elapsed().as_secs_f32();
        self.last_time = Instant::now();

        match running.ctx.acquire_frame() {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(FrameError::Reconfigure) => {
                log::warn!("Surface lost; reconfiguring.");
                let size = running.window.inner_size();
                running.ctx.resize(size.width, size.height);
                running.window.request_redraw();
                return;
            }
            Err(FrameError::Skip) => {
                running.window.request_redraw();
                return;
            }
            Err(e) => {
                log::error!("Unable to acquire a frame: {e}");
                running.window.request_redraw();
                return;
            }
        }

        let result = self
            .app
            .update(&running.ctx, &mut running.world, &self.input, dt);
        running.ctx.present();
        self.input.end_frame();
        running.window.request_redraw();
        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }
}

impl<A: Application> ApplicationHandler for Driver<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        self.input.handle_device_event(&event);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        self.input.handle_window_event(&event);
        match event {
            WindowEvent::Resized(size) => {
                if let Some(running) = self.running.as_mut() {
                    running.ctx.resize(size.width, size.height);
                    self.app.resized(&running.ctx, &mut running.world);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
        if self.input.quit {
            event_loop.exit();
        }
    }
}

/// Runs `app` until the window closes. Returns the first error the
/// application or the setup produced.
pub fn run<A: Application>(settings: WindowSettings, app: A) -> Result<()> {
    if let Err(e) = env_logger::try_init() {
        eprintln!("Warning: Could not initialize logger: {e}");
    }

    let event_loop = EventLoop::new()?;
    let mut driver = Driver {
        runtime: tokio::runtime::Runtime::new()?,
        settings,
        app,
        running: None,
        input: Input::new(),
        last_time: Instant::now(),
        error: None,
    };
    event_loop.run_app(&mut driver)?;
    match driver.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
