use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::constants::GRID_RESOLUTION;
use crate::error::Result;
use crate::gallery::Gallery;
use crate::particles::mesh;
use crate::settings::RenderConfig;

mod constants;
mod error;
mod fs;
mod gallery;
mod graphics;
mod images;
mod particles;
mod settings;

struct State {
    window: Arc<Window>,

    device: wgpu::Device,
    queue: wgpu::Queue,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface<'static>,
    surface_format: wgpu::TextureFormat,
    pipeline: crate::graphics::Pipeline,
}

impl State {
    async fn new(startup: Startup, window: Arc<Window>) -> State {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone()).unwrap();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptionsBase {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .unwrap();
        log::info!("using adapter {:?}", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .unwrap();

        let size = window.inner_size();

        let cap = surface.get_capabilities(&adapter);
        let surface_format = cap.formats[0];

        let pipeline = graphics::Pipeline::new(
            &device,
            size,
            surface_format.remove_srgb_suffix(),
            startup.gallery,
            startup.config,
            startup.resolution,
        );

        let mut state = State {
            window,
            device,
            queue,
            size,
            surface,
            surface_format,
            pipeline,
        };

        // Configure surface for the first time
        state.configure_surface();

        state
    }

    fn get_window(&self) -> &Window {
        &self.window
    }

    /// Image colours are drawn exactly as stored, so we render through a non-sRGB view.
    fn render_format(&self) -> wgpu::TextureFormat {
        self.surface_format.remove_srgb_suffix()
    }

    fn configure_surface(&mut self) {
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            view_formats: vec![self.render_format()],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            width: self.size.width.max(1),
            height: self.size.height.max(1),
            desired_maximum_frame_latency: 1,
            present_mode: wgpu::PresentMode::AutoVsync,
        };
        self.surface.configure(&self.device, &surface_config);
        self.pipeline.resize(&self.queue, self.size);
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            // Minimized; keep the old configuration until we get a real size again
            return;
        }
        self.size = new_size;

        // reconfigure the surface
        self.configure_surface();
    }

    fn render(&mut self) {
        match self.surface.get_current_texture() {
            Ok(surface_texture) => {
                self.pipeline.render(
                    &self.device,
                    &self.queue,
                    &surface_texture.texture,
                    self.render_format(),
                    self.window.scale_factor(),
                );

                self.window.pre_present_notify();
                surface_texture.present();
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.configure_surface();
            }
            Err(err) => {
                // On Linux this usually means the window was drawn over by something else.
                log::debug!("skipping frame: {err}");
            }
        }
    }
}

/// Everything decided from the command line before the window opens.
struct Startup {
    gallery: Gallery,
    config: RenderConfig,
    resolution: u32,
}

impl Startup {
    fn from_flags(flags: flags::Main) -> Result<Self> {
        let mut memories = match &flags.gallery {
            Some(path) => fs::read_gallery(path)?,
            None => Vec::new(),
        };
        memories.extend(fs::memories_from_paths(&flags.image));
        let gallery = Gallery::new(memories)?;
        log::info!("{} memories in the timeline", gallery.len());

        let mut config = RenderConfig::default();
        for text in &flags.set {
            config.apply_override(text)?;
        }

        Ok(Self {
            gallery,
            config,
            resolution: mesh::checked_resolution(
                flags.resolution.unwrap_or(GRID_RESOLUTION),
            )?,
        })
    }
}

struct App {
    startup: Option<Startup>,
    close_requested: bool,
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only the first resume creates the window
        let Some(startup) = self.startup.take() else {
            return;
        };

        // Create window object
        let window_attributes = Window::default_attributes().with_title("memory-particles");
        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let state = pollster::block_on(State::new(startup, window.clone()));
        self.state = Some(state);

        window.request_redraw();
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                self.close_requested = true;
            }
            WindowEvent::RedrawRequested => {
                state.render();

                // Request another redraw after this one so we keep a consistent framerate
                state.get_window().request_redraw();
            }
            WindowEvent::Resized(size) => {
                // Reconfigures the size of the surface. We do not re-render
                // here as this event is always followed up by redraw request.
                state.resize(size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::F11),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                // Toggle fullscreen
                let window = state.get_window();
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(window.current_monitor())));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                state.pipeline.handle_keypress(key);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
        }
    }
}

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        cmd main {
            /// JSON file listing the memories to browse
            optional --gallery file: PathBuf
            /// Particle grid points per side
            optional --resolution points: u32
            /// Start with a parameter changed, e.g. `--set flowSpeed=1.2`
            repeated --set assignment: String
            /// Images to browse after the gallery's memories, titled by file name
            repeated image: PathBuf
        }
    }
}

fn main() {
    // wgpu uses `log` for all of our logging, so we initialize a logger with the `env_logger` crate.
    //
    // To change the log level, set the `RUST_LOG` environment variable. See the `env_logger`
    // documentation for more information.
    env_logger::init();

    let startup = match Startup::from_flags(flags::Main::from_env_or_exit()) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("memory-particles: {err}");
            std::process::exit(1);
        }
    };

    let event_loop = EventLoop::new().unwrap();

    // When the current loop iteration finishes, immediately begin a new
    // iteration regardless of whether or not new events are available to
    // process. Preferred for applications that want to render as fast as
    // possible, like games.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        startup: Some(startup),
        state: None,
        close_requested: false,
    };
    event_loop.run_app(&mut app).unwrap();
}
