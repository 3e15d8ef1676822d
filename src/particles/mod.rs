//! The particle substrate and the per-particle math that animates it.
//!
//! Everything here runs on the CPU. The same math is expressed in `shaders/particles.wgsl`,
//! which is what actually drives the ~65k particles every frame; the CPU side exists so that the
//! behaviour can be checked without a GPU.

use std::time::Duration;

use crate::constants::{MAX_PIXEL_RATIO, Uniforms};
use crate::settings::RenderConfig;

pub mod displacement;
pub mod mesh;

/// What changes from one frame to the next, besides the config.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameState {
    /// Seconds since the render session started.
    pub time: f32,
    /// Device pixel ratio, clamped to `MAX_PIXEL_RATIO`.
    pub pixel_ratio: f32,
}

impl FrameState {
    pub fn new(elapsed: Duration, device_pixel_ratio: f64) -> Self {
        Self {
            time: elapsed.as_secs_f32(),
            pixel_ratio: (device_pixel_ratio as f32).min(MAX_PIXEL_RATIO),
        }
    }
}

/// Everything a single frame of particles depends on, gathered up front so that a config edit
/// in the middle of a frame can't tear it.
#[derive(Debug, Copy, Clone)]
pub struct FrameInputs {
    pub frame: FrameState,
    pub config: RenderConfig,
    pub view: glam::Mat4,
    pub projection: glam::Mat4,
    /// Surface size in physical pixels.
    pub viewport: glam::Vec2,
}

impl From<&FrameInputs> for Uniforms {
    fn from(inputs: &FrameInputs) -> Self {
        let FrameInputs {
            frame,
            config,
            view,
            projection,
            viewport,
        } = inputs;
        let config = config.sanitized();
        Uniforms {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            viewport: viewport.to_array(),
            time: frame.time,
            pixel_ratio: frame.pixel_ratio,
            size: config.particle_size,
            displacement_strength: config.depth_strength,
            flow_speed: config.flow_speed,
            flow_amplitude: config.flow_amplitude,
            dispersion: config.dispersion,
            contrast: config.contrast,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ConfigKey;

    #[test]
    fn pixel_ratio_is_clamped() {
        assert_eq!(FrameState::new(Duration::ZERO, 1.0).pixel_ratio, 1.0);
        assert_eq!(FrameState::new(Duration::ZERO, 1.5).pixel_ratio, 1.5);
        assert_eq!(FrameState::new(Duration::ZERO, 3.0).pixel_ratio, 2.0);
    }

    #[test]
    fn time_is_in_seconds() {
        let frame = FrameState::new(Duration::from_millis(2500), 1.0);
        assert_eq!(frame.time, 2.5);
    }

    #[test]
    fn uniforms_carry_sanitized_config() {
        let mut config = RenderConfig::default();
        config.set(ConfigKey::Contrast, f32::NAN);
        config.set(ConfigKey::DepthStrength, 1.75);
        let inputs = FrameInputs {
            frame: FrameState::new(Duration::from_secs(3), 2.0),
            config,
            view: glam::Mat4::IDENTITY,
            projection: glam::Mat4::IDENTITY,
            viewport: glam::vec2(800.0, 600.0),
        };
        let uniforms = Uniforms::from(&inputs);
        assert_eq!(uniforms.contrast, 1.1);
        assert_eq!(uniforms.displacement_strength, 1.75);
        assert_eq!(uniforms.time, 3.0);
        assert_eq!(uniforms.pixel_ratio, 2.0);
        assert_eq!(uniforms.viewport, [800.0, 600.0]);
        assert_eq!(uniforms.view, glam::Mat4::IDENTITY.to_cols_array_2d());
    }
}
