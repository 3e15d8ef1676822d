use bytemuck::{Pod, Zeroable};

/// Number of sample points along each side of the particle grid.
pub const GRID_RESOLUTION: u32 = 256;
/// Side length of the square plane the particle grid spans, in world units.
pub const PLANE_EXTENT: f32 = 4.0;

/// Device pixel ratios above this are clamped before feeding point sizes.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Decoded images larger than this on either side are downscaled before upload.
pub const MAX_SOURCE_DIMENSION: u32 = 2048;

pub const CAMERA_DISTANCE: f32 = 4.0;
pub const CAMERA_FOV_Y_DEGREES: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
/// Radians per second. One full turn every 120 seconds.
pub const CAMERA_AUTO_ROTATE_SPEED: f32 = 0.5 * std::f32::consts::TAU / 60.0;

/// Height of the parameter panel in the top-left corner, in physical pixels.
pub const PANEL_HEIGHT: u32 = 160;
/// Height of the caption at the bottom of the screen, in physical pixels.
pub const CAPTION_HEIGHT: u32 = 140;
/// Gap between the overlay text and the edges of the window, in physical pixels.
pub const OVERLAY_MARGIN: u32 = 16;

/// MUST exactly match the definition of `Uniforms` in particles.wgsl
#[repr(C)]
#[derive(Pod, Zeroable, Copy, Clone, Debug)]
pub struct Uniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Surface size in physical pixels.
    pub viewport: [f32; 2],
    pub time: f32,
    pub pixel_ratio: f32,
    pub size: f32,
    pub displacement_strength: f32,
    pub flow_speed: f32,
    pub flow_amplitude: f32,
    pub dispersion: f32,
    pub contrast: f32,
    pub _padding: [f32; 2],
}

/// MUST exactly match the `Particle` vertex input in particles.wgsl
#[repr(C)]
#[derive(Pod, Zeroable, Copy, Clone, Debug, PartialEq)]
pub struct ParticleVertex {
    pub uv: [f32; 2],
    pub position: [f32; 3],
}
