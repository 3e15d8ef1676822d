use std::time::Instant;

use winit::dpi::PhysicalSize;
use winit::keyboard::KeyCode;

use crate::gallery::Gallery;
use crate::images::loader::Loader;
use crate::settings::{ConfigKey, RenderConfig};

pub mod camera_3d;
mod frame_clock;
mod particles;
mod session;
mod text;

use camera_3d::Camera;
use text::ImageStatus;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Up/down arrows edit this parameter; left/right are left alone
    Param(ConfigKey),
}

pub struct Pipeline {
    mode: Mode,
    config: RenderConfig,
    camera: Camera,
    gallery: Gallery,
    loader: Loader,
    size: PhysicalSize<u32>,
    last_frame: Instant,

    particles: particles::Pipeline,
    text: Option<text::Pipeline<'static>>,
}

impl Pipeline {
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        render_format: wgpu::TextureFormat,
        gallery: Gallery,
        config: RenderConfig,
        resolution: u32,
    ) -> Self {
        let mut out = Self {
            mode: Mode::Normal,
            config,
            camera: Camera::new(),
            gallery,
            loader: Loader::spawn(),
            size,
            last_frame: Instant::now(),
            particles: particles::Pipeline::new(device, render_format, resolution),
            text: text::Pipeline::new(device, size, render_format),
        };

        out.set_mode(Mode::Normal);

        out
    }

    fn set_mode(&mut self, new_mode: Mode) {
        self.mode = new_mode;
        if let Some(text) = &mut self.text {
            text.set_highlighted(match new_mode {
                Mode::Normal => None,
                Mode::Param(key) => Some(key),
            });
            text.set_config(&self.config);
        }
    }

    fn set_config(&mut self) {
        if let Some(text) = &mut self.text {
            text.set_config(&self.config);
        }
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if let Some(text) = &mut self.text {
            text.resize(queue, new_size);
        }
    }

    pub fn handle_keypress(&mut self, key: KeyCode) {
        use Mode::*;
        match key {
            KeyCode::Escape => {
                self.set_mode(Normal);
                return;
            }
            KeyCode::F5 => {
                self.config.reset();
                log::info!("render parameters reset to defaults");
                self.set_config();
                return;
            }
            KeyCode::Space => {
                self.camera.toggle_auto_rotate();
                return;
            }
            KeyCode::KeyH => {
                if let Some(text) = &mut self.text {
                    text.toggle_visible();
                }
                return;
            }
            _ => {}
        }

        match self.mode {
            Normal => {
                if let Some(config_key) = ConfigKey::activate(key) {
                    self.set_mode(Param(config_key));
                    return;
                }
                let moved = match key {
                    KeyCode::ArrowRight => self.gallery.next(),
                    KeyCode::ArrowLeft => self.gallery.previous(),
                    _ => return,
                };
                if moved {
                    let memory = self.gallery.active();
                    log::info!("showing {} ({})", memory.id, memory.title);
                }
            }
            Param(config_key) => {
                let steps = match key {
                    KeyCode::ArrowUp => 1.0,
                    KeyCode::ArrowDown => -1.0,
                    _ => {
                        if let Some(new_key) = ConfigKey::activate(key) {
                            if new_key == config_key {
                                self.set_mode(Normal);
                            } else {
                                self.set_mode(Param(new_key));
                            }
                        }
                        return;
                    }
                };
                self.config.nudge(config_key, steps);
                self.set_config();
            }
        }
    }

    /// Binds the active memory's image once it is decoded, and keeps the caption in step with
    /// its load state. A memory whose image failed or is still loading shows no particles.
    fn sync_active_memory(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.loader.pump(&self.gallery);

        let memory = self.gallery.active();
        let (image, failure) = match self.loader.get(&memory.id) {
            Some(Ok(image)) => (Some(image.as_ref()), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => {
                if !self.loader.is_loading(&memory.id) {
                    log::trace!("{} waiting on another decode", memory.id);
                }
                (None, None)
            }
        };
        self.particles.bind(device, queue, &memory.id, image);

        if let Some(text) = &mut self.text {
            let status = if let Some(reason) = &failure {
                ImageStatus::Failed(reason)
            } else if self.particles.memory_id() == Some(memory.id.as_str()) {
                ImageStatus::Shown
            } else {
                ImageStatus::Loading
            };
            text.set_caption(
                memory,
                self.gallery.active_index(),
                self.gallery.len(),
                status,
            );
        }
    }

    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_texture: &wgpu::Texture,
        render_format: wgpu::TextureFormat,
        scale_factor: f64,
    ) {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.sync_active_memory(device, queue);
        self.camera.advance(dt);

        // Every parameter read this frame comes from the same snapshot.
        let config = self.config;
        let viewport = glam::vec2(self.size.width as f32, self.size.height as f32);
        let aspect = viewport.x / viewport.y;
        self.particles.prepare(
            queue,
            scale_factor,
            config,
            self.camera.view(),
            self.camera.projection(aspect),
            viewport,
        );
        if let Some(text) = &mut self.text {
            text.prepare(device, queue);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        let surface_texture_view = surface_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("surface_texture_view"),
            format: Some(render_format),
            dimension: Some(wgpu::TextureViewDimension::D2),
            usage: Some(wgpu::TextureUsages::RENDER_ATTACHMENT),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: None,
            base_array_layer: 0,
            array_layer_count: None,
        });

        {
            // Create the renderpass which will clear the screen before drawing anything
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.particles.render_pass(&mut render_pass);
            if let Some(text) = &self.text {
                text.render_pass(&mut render_pass);
            }
        }

        queue.submit([encoder.finish()]);
    }
}
