use crate::constants::{PLANE_EXTENT, ParticleVertex, Uniforms};
use crate::graphics::frame_clock::FrameClock;
use crate::graphics::session::SessionSlot;
use crate::images::SourceImage;
use crate::particles::FrameInputs;
use crate::particles::mesh::ParticleMesh;
use crate::settings::RenderConfig;

const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

/// Vertices per particle quad; see `corners` in particles.wgsl.
const VERTICES_PER_PARTICLE: u32 = 6;

pub struct Pipeline {
    uniforms_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    render_pipeline: wgpu::RenderPipeline,

    /// Points per side of the particle grid built for every session.
    resolution: u32,
    /// The memory currently on screen, if its image is loaded.
    session: SessionSlot<Session>,
}

/// Everything bound to one memory's image. Replaced wholesale when the active memory changes;
/// the texture is released as soon as the session is dropped.
struct Session {
    memory_id: String,
    num_particles: u32,
    particle_buffer: wgpu::Buffer,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    clock: FrameClock,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bind_group_layout: &wgpu::BindGroupLayout,
        uniforms_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        resolution: u32,
        memory_id: &str,
        image: &SourceImage,
    ) -> Option<Self> {
        let mesh = ParticleMesh::new(resolution, PLANE_EXTENT);
        let Ok(num_particles) = u32::try_from(mesh.len()) else {
            log::error!("{memory_id}: {} particles is too many to draw", mesh.len());
            return None;
        };
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("particles_buffer_{memory_id}")),
            size: size_of_val(mesh.vertices()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&particle_buffer, 0, bytemuck::cast_slice(mesh.vertices()));

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("image_texture_{memory_id}")),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Not sRGB: the shader works on the stored values directly.
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("particle_bind_group_{memory_id}")),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
            ],
        });

        log::info!(
            "session for {memory_id}: {}x{} image, {}x{} particles",
            image.width(),
            image.height(),
            mesh.resolution(),
            mesh.resolution(),
        );
        Some(Self {
            memory_id: memory_id.to_owned(),
            num_particles,
            particle_buffer,
            texture,
            bind_group,
            clock: FrameClock::start(),
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        log::debug!("releasing session for {}", self.memory_id);
        self.texture.destroy();
        self.particle_buffer.destroy();
    }
}

impl Pipeline {
    pub fn new(device: &wgpu::Device, render_format: wgpu::TextureFormat, resolution: u32) -> Self {
        let uniforms_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_uniforms_buffer"),
            size: size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Written every frame in prepare()

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("image_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            lod_min_clamp: 0.,
            lod_max_clamp: 32.,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("particle_bind_group_layout"),
            entries: &[
                // uni
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // image_sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // image
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particle_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader_module = device.create_shader_module(wgpu::include_wgsl!(
            "../shaders/particles.wgsl"
        ));
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle render pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some("vs"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: size_of::<ParticleVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &PARTICLE_ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some("fs"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: render_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            // Particles are flat dots with no depth buffer; later instances draw over earlier
            // ones.
            primitive: Default::default(),
            depth_stencil: Default::default(),
            multisample: Default::default(),
            multiview: Default::default(),
            cache: Default::default(),
        });

        Self {
            uniforms_buffer,
            sampler,
            bind_group_layout,
            render_pipeline,
            resolution,
            session: SessionSlot::new(),
        }
    }

    /// The memory whose image is currently bound, if any.
    pub fn memory_id(&self) -> Option<&str> {
        self.session.memory_id()
    }

    /// Follows the active memory. Once `image` is decoded, builds a fresh mesh and texture for
    /// `memory_id` unless that memory is already bound; while it's loading or failed
    /// (`image` is `None`), nothing is bound.
    pub fn bind(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        memory_id: &str,
        image: Option<&SourceImage>,
    ) {
        self.session.follow(memory_id, image, |image| {
            Session::new(
                device,
                queue,
                &self.bind_group_layout,
                &self.uniforms_buffer,
                &self.sampler,
                self.resolution,
                memory_id,
                image,
            )
        });
    }

    /// Ticks the session clock and uploads this frame's uniforms. `config` is a snapshot taken
    /// at the start of the frame.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        scale_factor: f64,
        config: RenderConfig,
        view: glam::Mat4,
        projection: glam::Mat4,
        viewport: glam::Vec2,
    ) {
        let Some(session) = self.session.session_mut() else {
            return;
        };
        let inputs = FrameInputs {
            frame: session.clock.tick(scale_factor),
            config,
            view,
            projection,
            viewport,
        };
        queue.write_buffer(
            &self.uniforms_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::from(&inputs)),
        );
    }

    pub fn render_pass(&self, render_pass: &mut wgpu::RenderPass) {
        let Some(session) = self.session.session() else {
            return;
        };
        if session.num_particles == 0 {
            return;
        }
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &session.bind_group, &[]);
        render_pass.set_vertex_buffer(0, session.particle_buffer.slice(..));
        render_pass.draw(0..VERTICES_PER_PARTICLE, 0..session.num_particles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADER: &str = include_str!("../shaders/particles.wgsl");

    fn parse_shader() -> naga::Module {
        naga::front::wgsl::parse_str(SHADER)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(SHADER)))
    }

    #[test]
    fn shader_validates() {
        let module = parse_shader();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap();
        for entry_point in ["vs", "fs"] {
            assert!(module.entry_points.iter().any(|ep| ep.name == entry_point));
        }
    }

    #[test]
    fn shader_uniforms_match_rust_layout() {
        let module = parse_shader();
        let (_, uniforms) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Uniforms"))
            .unwrap();
        assert_eq!(
            uniforms.inner.size(module.to_ctx()) as usize,
            size_of::<Uniforms>()
        );

        let (_, particle) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Particle"))
            .unwrap();
        let naga::TypeInner::Struct { members, .. } = &particle.inner else {
            panic!("Particle is not a struct");
        };
        assert_eq!(members.len(), PARTICLE_ATTRIBUTES.len());
    }
}
