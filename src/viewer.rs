//! The render driver and application event loop.
//!
//! A [`Viewer`] owns the whole lifecycle: create the window, load the asset
//! table, assemble the scene, then drive the frame loop until the window
//! closes. Asset loading is async and platform-dependent, so setup runs on
//! tokio natively and through `spawn_local` plus a user event on the web.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and kicks off asset loading
//! 2. Once loaded, the scene is assembled, uploaded and the loop starts
//! 3. Each redraw ticks the clock, updates camera/clips/mixers and renders
//! 4. Clips autoplay; a left click re-triggers playback for browsers that
//!    block autoplay
//! 5. Close disposes the scene and exits

use std::{cell::RefCell, iter, rc::Rc, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    animation::{AnimationClip, AnimationMixer, MixerRegistry},
    assembler::Assembler,
    assets::{AssetTable, VideoSource},
    context::{Context, FrameClock},
    scene::{Scene, UploadCtx},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything needed to start a viewer: the asset table to load, the
/// assembler that turns it into a scene, and the clear colour. The resize
/// hook, when set, runs before the surface is reconfigured.
pub struct ViewerConfig {
    pub assets: AssetTable,
    pub assembler: Assembler,
    pub background: wgpu::Color,
    pub on_resize: Option<Box<dyn FnMut(u32, u32)>>,
}

/// Frame-loop lifecycle. `Disposed` is terminal; a disposed viewer never
/// starts looping again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Constructed,
    Looping,
    Stopped,
    Disposed,
}

impl LoopState {
    pub fn start(&mut self) -> bool {
        match self {
            Self::Constructed | Self::Stopped => {
                *self = Self::Looping;
                true
            }
            Self::Looping | Self::Disposed => false,
        }
    }

    pub fn stop(&mut self) -> bool {
        match self {
            Self::Looping => {
                *self = Self::Stopped;
                true
            }
            _ => false,
        }
    }

    pub fn dispose(&mut self) {
        *self = Self::Disposed;
    }

    pub fn is_looping(&self) -> bool {
        matches!(self, Self::Looping)
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed)
    }
}

/// Counts frames and logs the rate once per second.
#[derive(Debug)]
pub struct FrameStats {
    frames: u32,
    window_start: Instant,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
        }
    }

    /// Record one frame. Returns the rate when a full second has elapsed.
    pub fn record_frame(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = Instant::now();
            return Some(fps);
        }
        None
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

/// The fully initialized viewer: GPU context plus the assembled scene and
/// its runtime state.
pub struct ViewerState {
    pub(crate) ctx: Context,
    scene: Scene,
    video: Option<Rc<RefCell<VideoSource>>>,
    mixers: MixerRegistry,
    clock: FrameClock,
    loop_state: LoopState,
    stats: FrameStats,
    is_surface_configured: bool,
    on_resize: Option<Box<dyn FnMut(u32, u32)>>,
}

impl ViewerState {
    async fn new(window: Arc<Window>, config: ViewerConfig) -> Self {
        let ctx = Context::new(window).await;
        let mut ctx = match ctx {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "Viewer initialization failed. Cannot create the main context: {}",
                e
            ),
        };

        let ViewerConfig {
            mut assets,
            assembler,
            background,
            on_resize,
        } = config;

        if let Err(e) = assets.load_all().await {
            panic!("Viewer initialization failed. Asset loading failed: {}", e);
        }

        let assembled = match assembler.assemble(&assets) {
            Ok(assembled) => assembled,
            Err(e) => panic!("Viewer initialization failed. Scene assembly failed: {}", e),
        };

        let mut scene = assembled.scene;
        scene.upload(&UploadCtx {
            device: &ctx.device,
            queue: &ctx.queue,
            material_layout: &ctx.material_layout,
        });

        ctx.clear_colour = background;
        let intensity = ctx.light.uniform.intensity;
        ctx.light.set_ambient(&ctx.queue, assembled.ambient, intensity);

        let mut loop_state = LoopState::Constructed;
        loop_state.start();

        Self {
            ctx,
            scene,
            video: assembled.video,
            mixers: assembled.mixers,
            clock: FrameClock::new(),
            loop_state,
            stats: FrameStats::new(),
            is_surface_configured: false,
            on_resize,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            if let Some(hook) = &mut self.on_resize {
                hook(width, height);
            }
            self.is_surface_configured = true;
            self.ctx.resize(width, height);
        }
    }

    /// Register a named animation mixer, replacing any previous one.
    pub fn create_animation_mixer(&mut self, name: &str, clips: Vec<AnimationClip>) {
        self.mixers.create(name, clips);
    }

    /// Look up a named mixer. A missing name is an explicit error.
    pub fn animation_mixer(&mut self, name: &str) -> anyhow::Result<&mut AnimationMixer> {
        self.mixers.get_mut(name)
    }

    /// Fallback play trigger for hosts that block autoplay.
    fn on_click(&mut self) {
        if let Some(video) = &self.video {
            let mut video = video.borrow_mut();
            if !video.is_playing() {
                log::info!("starting clip playback");
                video.play();
            }
        }
    }

    fn dispose(&mut self) {
        if self.loop_state.is_disposed() {
            return;
        }
        self.loop_state.dispose();
        self.scene.clear();
        self.video = None;
        self.mixers = MixerRegistry::new();
        log::info!("viewer disposed");
    }

    fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.loop_state.is_looping() || !self.is_surface_configured {
            return Ok(());
        }
        // Schedule the next frame only while looping; the `Occluded` handler
        // re-requests one when the loop restarts.
        self.ctx.window.request_redraw();

        let dt = self.clock.tick();

        // Camera
        self.ctx
            .camera
            .controller
            .update(&mut self.ctx.camera.camera, dt);
        self.ctx
            .camera
            .uniform
            .update_view_proj(&self.ctx.camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        // Animation
        self.mixers.update_all(dt);
        if let Some(video) = &self.video {
            let mut video = video.borrow_mut();
            if video.advance(dt) {
                self.scene
                    .write_video_frames(&self.ctx.queue, video.current_frame());
            }
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.ctx.pipeline);
            render_pass.set_bind_group(1, &self.ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.ctx.light.bind_group, &[]);
            self.scene.draw(&mut render_pass);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        if let Some(fps) = self.stats.record_frame() {
            log::debug!("{fps:.1} fps, {} nodes", self.scene.node_count());
        }

        Ok(())
    }
}

pub(crate) enum ViewerEvent {
    #[allow(dead_code)]
    Initialized(Box<ViewerState>),
    #[allow(dead_code)]
    Exit,
}

pub struct Viewer {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<ViewerEvent>,
    state: Option<ViewerState>,
    // Taken in `resumed`; the window has to exist before setup can run.
    config: Option<ViewerConfig>,
}

impl Viewer {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            config: Some(config),
        }
    }
}

impl ApplicationHandler<ViewerEvent> for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

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

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let config = self.config.take().unwrap();
        let init_future = ViewerState::new(window, config);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut state = self.async_runtime.block_on(init_future);
            let size = state.ctx.window.inner_size();
            state.resize(size.width, size.height);
            state.ctx.window.request_redraw();
            self.state = Some(state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future.await;
                assert!(
                    proxy
                        .send_event(ViewerEvent::Initialized(Box::new(state)))
                        .is_ok()
                );
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let mut state = *state;

                // Trigger a resize and redraw now that we are initialized
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            ViewerEvent::Exit => {
                if let Some(state) = &mut self.state {
                    state.dispose();
                }
                event_loop.exit();
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

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => {
                state.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            // Pause the loop while the window is fully hidden.
            WindowEvent::Occluded(occluded) => {
                if occluded {
                    state.loop_state.stop();
                } else if state.loop_state.start() {
                    // Swallow the hidden interval so clips do not jump ahead.
                    state.clock.tick();
                    state.ctx.window.request_redraw();
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => state.on_click(),
            WindowEvent::RedrawRequested => match state.frame() {
                Ok(()) => {}
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                }
                Err(e) => {
                    log::error!("Unable to render {}", e);
                }
            },
            _ => {}
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
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

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut viewer = Viewer::new(&event_loop, config);

    event_loop.run_app(&mut viewer)?;

    Ok(())
}
