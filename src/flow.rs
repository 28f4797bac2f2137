//! Application shell and event loop.
//!
//! [`run`] opens a window (the `canvas` element on wasm), acquires a
//! [`Context`] and mounts one [`SurfaceMount`] on it. winit events are routed
//! through the [`EventRouter`]: a surface only sees the kinds of events it
//! registered a listener for. Redraws deliver the pending frame requests.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and starts context acquisition
//! 2. once the context resolved (or failed), the surface is mounted
//! 3. `RedrawRequested` drains the [`FrameQueue`] into the mount
//! 4. `CloseRequested` disposes the mount and exits

use std::{fmt::Debug, sync::Arc};

use instant::Duration;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::EngineConfig,
    context::Context,
    error::EngineError,
    gpu::Gpu,
    host::{Clock, EventRouter, FrameQueue, Host, InstantClock, ListenerKind, SurfaceId},
    scene_builder::ModelKind,
    scroll::StyleMutation,
    surface::SurfaceMount,
    viewport::SurfaceSize,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// The single surface the shell drives.
const SURFACE: SurfaceId = SurfaceId(0);
/// Pixels scrolled per wheel line.
const LINE_HEIGHT: f32 = 40.0;

/// Everything that exists once the window is up.
#[derive(Debug)]
struct AppState {
    window: Arc<Window>,
    ctx: Option<Context>,
    mount: SurfaceMount,
    frames: FrameQueue,
    router: EventRouter,
    clock: InstantClock,
    scroll: f32,
    /// Clock reading of the last page tick, for mounts without a scene.
    last_tick: Duration,
}

impl AppState {
    fn new(window: Arc<Window>, ctx: Result<Context, EngineError>, kind: ModelKind, config: &EngineConfig) -> Self {
        let ctx = ctx
            .inspect_err(|e| log::warn!("continuing without a rendering context: {e}"))
            .ok();
        let mut state = Self {
            window,
            ctx,
            mount: SurfaceMount::inert(SURFACE, kind, config),
            frames: FrameQueue::new(),
            router: EventRouter::new(),
            clock: InstantClock::new(),
            scroll: 0.0,
            last_tick: Duration::ZERO,
        };
        let size = state.surface_size(state.window.inner_size());
        let mount = {
            let (_, mut host) = state.split();
            SurfaceMount::mount(SURFACE, kind, config, size, &mut host, &mut rand::thread_rng())
        };
        state.mount = mount;
        state.window.request_redraw();
        state
    }

    /// Borrows the mount and a host view over the rest of the state.
    fn split(&mut self) -> (&mut SurfaceMount, Host<'_>) {
        let host = Host {
            gpu: self.ctx.as_mut().map(|ctx| ctx as &mut dyn Gpu),
            scheduler: &mut self.frames,
            listeners: &mut self.router,
            clock: &self.clock,
        };
        (&mut self.mount, host)
    }

    fn surface_size(&self, physical: PhysicalSize<u32>) -> SurfaceSize {
        let scale = self.window.scale_factor();
        SurfaceSize::new(physical.width as f64 / scale, physical.height as f64 / scale)
            .with_scale_factor(scale)
    }

    /// Viewport extent in logical pixels.
    fn viewport(&self) -> (f32, f32) {
        let size = self.surface_size(self.window.inner_size());
        (size.width as f32, size.height as f32)
    }

    fn listening(&self, kind: ListenerKind) -> bool {
        self.router.is_listening(SURFACE, kind)
    }

    fn apply(&self, mutations: Vec<StyleMutation>) {
        for mutation in mutations {
            log::trace!(
                "{} {:?} = {}",
                mutation.target,
                mutation.property,
                mutation.value
            );
        }
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized {
        window: Arc<Window>,
        ctx: Result<Context, EngineError>,
    },
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { ctx, .. } => f
                .debug_struct("Initialized")
                .field("ctx", &ctx.as_ref().map(|_| "Context"))
                .finish(),
        }
    }
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    kind: ModelKind,
    config: EngineConfig,
    state: Option<AppState>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        kind: ModelKind,
        config: EngineConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            kind,
            config,
            state: None,
        })
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_transparent(true);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = Context::new(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let ctx = self.async_runtime.block_on(init_future);
            self.state = Some(AppState::new(window, ctx, self.kind, &self.config));
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let ctx = init_future.await;
                if proxy
                    .send_event(FlowEvent::Initialized { window, ctx })
                    .is_err()
                {
                    log::error!("event loop closed before the context was ready");
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized { window, ctx } => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(AppState::new(window, ctx, self.kind, &self.config));
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                let (mount, mut host) = state.split();
                let reverted = mount.dispose(&mut host);
                state.apply(reverted);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if state.listening(ListenerKind::Resize) {
                    let size = state.surface_size(size);
                    let (mount, mut host) = state.split();
                    mount.on_resize(size, &mut host);
                }
                let (_, height) = state.viewport();
                let fired = state.mount.scroll().refresh(height);
                log::debug!("layout refresh fired {} scroll events", fired.len());
            }
            WindowEvent::CursorEntered { .. } => {
                if state.listening(ListenerKind::PointerEnter) {
                    state.mount.on_pointer_enter();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if state.listening(ListenerKind::PointerLeave) {
                    state.mount.on_pointer_leave();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if state.listening(ListenerKind::PointerMove) {
                    let scale = state.window.scale_factor();
                    let viewport = state.viewport();
                    state.mount.on_pointer_move(
                        (position.x / scale) as f32,
                        (position.y / scale) as f32,
                        viewport,
                    );
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(p) => -(p.y / state.window.scale_factor()) as f32,
                };
                state.scroll = (state.scroll + dy).max(0.0);
                if !state.listening(ListenerKind::Scroll) {
                    return;
                }
                let was_animating = state.mount.is_animating();
                let (_, height) = state.viewport();
                let scroll = state.scroll;
                for (region, event) in state.mount.scroll().on_scroll(scroll, height) {
                    log::debug!("{region:?}: {event:?}");
                }
                // a blank mount has no frame loop; redraws drive its ticks
                if !state.mount.is_live() && !was_animating && state.mount.is_animating() {
                    state.last_tick = state.clock.now();
                    state.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let due = state.frames.take_due();
                let (mount, mut host) = state.split();
                for request in due {
                    mount.on_frame(request, &mut host);
                }
                if !state.mount.is_live() && state.mount.is_animating() {
                    let now = state.clock.now();
                    state.mount.tick(now.saturating_sub(state.last_tick).as_secs_f32());
                    state.last_tick = now;
                    state.window.request_redraw();
                }
                let mutations = state.mount.take_mutations();
                state.apply(mutations);
                if state.frames.pending() > 0 && state.ctx.is_none() {
                    state.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Opens a window showing `kind` with the default configuration.
pub fn run(kind: ModelKind) -> anyhow::Result<()> {
    run_with(kind, EngineConfig::default())
}

pub fn run_with(kind: ModelKind, config: EngineConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, kind, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
