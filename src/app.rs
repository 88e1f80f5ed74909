use crate::{
    config::WindowConfig,
    io::Io,
    render::{FrameOutcome, Renderer},
    scene::Scene,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to create the event loop")]
    CreateEventLoop(#[source] winit::error::EventLoopError),

    #[error("Failed to create the window")]
    CreateWindow(#[source] winit::error::OsError),

    #[error("Failed to initialize the renderer")]
    Renderer(#[from] crate::gpu::Error),

    #[error("The event loop stopped with an error")]
    RunEventLoop(#[source] winit::error::EventLoopError),

    #[error("No canvas element with id '{0}' exists in the page")]
    CanvasNotFound(String),
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// Installs the platform logger: `env_logger` natively, the browser console
/// on the web.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    if let Err(error) =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()
    {
        log::debug!("Logger was already initialized: {error}");
    }
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(error) = console_log::init_with_level(log::Level::Info) {
        log::debug!("Logger was already initialized: {error}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run(state: impl State + 'static) -> Result<()> {
    pollster::block_on(run_async(state))
}

#[cfg(target_arch = "wasm32")]
pub fn run(state: impl State + 'static) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(error) = run_async(state).await {
            log::error!("{error}");
        }
    });
}

pub async fn run_async(mut state: impl State + 'static) -> Result<()> {
    let event_loop = winit::event_loop::EventLoop::new().map_err(Error::CreateEventLoop)?;

    let window_config = state.window();

    #[allow(unused_mut)]
    let mut builder = winit::window::WindowBuilder::new();

    if !cfg!(target_arch = "wasm32") {
        builder = builder
            .with_title(window_config.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                window_config.width,
                window_config.height,
            ));
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::WindowBuilderExtWebSys;
        builder = builder.with_canvas(Some(find_canvas(&window_config.canvas_id)?));
    }

    let window = builder.build(&event_loop).map_err(Error::CreateWindow)?;
    let window = std::sync::Arc::new(window);

    let window_size = window.inner_size();
    let (width, height) = (window_size.width, window_size.height);
    let mut renderer = Renderer::new(window.clone(), width, height).await?;

    let mut context = Context {
        io: Io::default(),
        delta_time: 0.01,
        last_frame: chrono::Utc::now(),
        scene: Scene::default(),
        frame_loop: FrameLoop::default(),
        should_reload_view: true,
    };

    let gui_context = egui::Context::default();
    gui_context.set_pixels_per_point(window.scale_factor() as f32);
    let viewport_id = gui_context.viewport_id();
    let mut gui_state = egui_winit::State::new(
        gui_context,
        viewport_id,
        &window,
        Some(window.scale_factor() as _),
        None,
    );

    state.initialize(&mut context);
    log::info!("Starting frame loop");

    event_loop
        .run(move |event, elwt| {
            if let winit::event::Event::NewEvents(..) = &event {
                let now = chrono::Utc::now();
                let duration_since_last_frame = now.signed_duration_since(context.last_frame);
                context.delta_time = duration_since_last_frame
                    .num_microseconds()
                    .unwrap_or_default() as f64
                    / 1_000_000.0;
                context.last_frame = now;
            }

            if let winit::event::Event::WindowEvent { ref event, .. } = &event {
                let response = gui_state.on_window_event(&window, event);
                if response.repaint {
                    window.request_redraw();
                }
                if response.consumed {
                    return;
                }
            }

            context.io.receive_event(
                &event,
                renderer.gpu.window_center(),
                window.scale_factor() as f32,
            );
            state.receive_event(&mut context, &event);

            if context.should_reload_view {
                renderer.load_scene(&context.scene);
                context.should_reload_view = false;
            }

            match event {
                winit::event::Event::WindowEvent { ref event, .. } => match event {
                    winit::event::WindowEvent::KeyboardInput {
                        event:
                            winit::event::KeyEvent {
                                physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                                state: winit::event::ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                            elwt.exit();
                        } else if !context.frame_loop.is_running() {
                            window.request_redraw();
                        }
                    }

                    winit::event::WindowEvent::MouseInput { .. }
                    | winit::event::WindowEvent::Touch(..) => {
                        if !context.frame_loop.is_running() {
                            window.request_redraw();
                        }
                    }

                    winit::event::WindowEvent::CloseRequested => {
                        elwt.exit();
                    }

                    winit::event::WindowEvent::Resized(winit::dpi::PhysicalSize {
                        width,
                        height,
                    }) => {
                        if *width > 0 && *height > 0 {
                            renderer.resize(*width, *height);
                            window.request_redraw();
                        }
                    }

                    winit::event::WindowEvent::RedrawRequested => {
                        let window_size = window.inner_size();
                        if window_size.width == 0 || window_size.height == 0 {
                            return;
                        }

                        let gui_input = gui_state.take_egui_input(&window);
                        gui_state.egui_ctx().begin_frame(gui_input);

                        state.ui(&mut context, gui_state.egui_ctx());

                        let egui::FullOutput {
                            textures_delta,
                            shapes,
                            pixels_per_point,
                            ..
                        } = gui_state.egui_ctx().end_frame();

                        let paint_jobs = gui_state.egui_ctx().tessellate(shapes, pixels_per_point);

                        let screen_descriptor = egui_wgpu::ScreenDescriptor {
                            size_in_pixels: [window_size.width, window_size.height],
                            pixels_per_point: window.scale_factor() as f32,
                        };

                        let outcome = renderer.render_frame(
                            &context.scene,
                            &textures_delta,
                            paint_jobs,
                            screen_descriptor,
                        );
                        if outcome == FrameOutcome::Fatal {
                            elwt.exit();
                        }
                    }

                    _ => {}
                },

                winit::event::Event::AboutToWait => {
                    if context.frame_loop.tick() {
                        elwt.set_control_flow(winit::event_loop::ControlFlow::Poll);
                        state.update(&mut context);
                        window.request_redraw();
                    } else {
                        elwt.set_control_flow(winit::event_loop::ControlFlow::Wait);
                    }
                }

                winit::event::Event::LoopExiting => {
                    log::info!(
                        "Exiting after {} frames",
                        context.frame_loop.frames()
                    );
                    state.shutdown(&mut context);
                }

                _ => {}
            }
        })
        .map_err(Error::RunEventLoop)
}

#[cfg(target_arch = "wasm32")]
fn find_canvas(id: &str) -> Result<web_sys::HtmlCanvasElement> {
    use web_sys::wasm_bindgen::JsCast;
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
        .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .ok_or_else(|| Error::CanvasNotFound(id.to_string()))
}

pub struct Context {
    pub io: Io,
    pub delta_time: f64,
    pub last_frame: chrono::DateTime<chrono::Utc>,
    pub scene: Scene,
    pub frame_loop: FrameLoop,
    pub should_reload_view: bool,
}

pub trait State {
    fn window(&self) -> WindowConfig {
        WindowConfig::default()
    }

    /// Called once before the main loop
    fn initialize(&mut self, _context: &mut Context) {}

    /// Called when a winit event is received
    fn receive_event(&mut self, _context: &mut Context, _event: &winit::event::Event<()>) {}

    /// Called once per frame while the frame loop is running
    fn update(&mut self, _context: &mut Context) {}

    /// Called every time a frame is drawn, running or not
    fn ui(&mut self, _context: &mut Context, _ui: &egui::Context) {}

    /// Called once when the event loop exits
    fn shutdown(&mut self, _context: &mut Context) {}
}

/// Owns whether simulation frames are being scheduled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self {
            running: true,
            frames: 0,
        }
    }
}

impl FrameLoop {
    pub fn start(&mut self) {
        if !self.running {
            log::info!("Frame loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Frame loop stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Counts a frame if the loop is running and reports whether one was due.
    pub fn tick(&mut self) -> bool {
        if self.running {
            self.frames += 1;
        }
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_loop_starts_running() {
        let frame_loop = FrameLoop::default();
        assert!(frame_loop.is_running());
        assert_eq!(frame_loop.frames(), 0);
    }

    #[test]
    fn ticks_only_count_while_running() {
        let mut frame_loop = FrameLoop::default();
        assert!(frame_loop.tick());
        assert!(frame_loop.tick());
        frame_loop.stop();
        assert!(!frame_loop.tick());
        assert_eq!(frame_loop.frames(), 2);
        frame_loop.start();
        assert!(frame_loop.tick());
        assert_eq!(frame_loop.frames(), 3);
    }

    #[test]
    fn toggle_flips_and_repeated_calls_are_stable() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.toggle();
        assert!(!frame_loop.is_running());
        frame_loop.stop();
        assert!(!frame_loop.is_running());
        frame_loop.toggle();
        assert!(frame_loop.is_running());
        frame_loop.start();
        assert!(frame_loop.is_running());
    }
}
