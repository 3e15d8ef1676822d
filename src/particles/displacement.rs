//! CPU rendition of the vertex and fragment stages in `shaders/particles.wgsl`. Keep the two in
//! sync: every constant here has a twin in the shader.

#![cfg_attr(not(test), allow(dead_code))]

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::constants::ParticleVertex;
use crate::particles::FrameInputs;

/// Rec. 601 luma weights.
pub const LUMA: Vec3 = Vec3::new(0.299, 0.587, 0.114);
/// Distance from the centre of the unit square to one of its corners, rounded the way the
/// shader has always rounded it.
pub const CENTER_TO_CORNER: f32 = 0.707;
/// Scales time before it's mixed into the dispersion noise, so the noise drifts very slowly.
pub const NOISE_TIME_SCALE: f32 = 0.0001;
/// Particles darker than this get a point size of zero.
pub const DARK_CULL_THRESHOLD: f32 = 0.05;

const DISPERSION_SCALE: f32 = 0.01;
const FLOW_WAVE_NUMBER: f32 = 20.0;
const FLOW_SCALE: f32 = 0.02;
const SIZE_ATTENUATION: f32 = 10.0;

pub fn brightness(color: Vec3) -> f32 {
    color.dot(LUMA)
}

/// Hermite interpolation between `edge0` and `edge1`, as in WGSL/GLSL.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// ~0 over the inner half of the image, ramping up to 1 at the corners.
pub fn radial_factor(uv: Vec2) -> f32 {
    let distance = uv.distance(Vec2::splat(0.5)) / CENTER_TO_CORNER;
    let factor = smoothstep(0.5, 1.0, distance);
    factor * factor
}

/// The classic sine hash. Uses the GLSL definition of `fract` (`x - floor(x)`), which differs
/// from `f32::fract` for negative inputs.
pub fn noise(st: Vec2) -> f32 {
    let x = st.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.547;
    x - x.floor()
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Displaced {
    /// Offset added to the particle's base position.
    pub offset: Vec3,
    /// Base position plus offset, in world space.
    pub position: Vec3,
    /// On-screen diameter in physical pixels. Zero means the particle isn't drawn.
    pub point_size: f32,
    /// The sampled texel colour, before contrast.
    pub color: Vec3,
}

/// Moves one particle for one frame. `color` is the texel sampled at the particle's UV.
pub fn displace(particle: &ParticleVertex, color: Vec3, inputs: &FrameInputs) -> Displaced {
    let uv = Vec2::from_array(particle.uv);
    let base = Vec3::from_array(particle.position);
    let config = &inputs.config;
    let time = inputs.frame.time;

    let brightness = brightness(color);
    let radial = radial_factor(uv);
    let noise = noise(uv + time * NOISE_TIME_SCALE);

    let spread = (noise - 0.5) * config.dispersion * DISPERSION_SCALE * radial;
    let offset = Vec3::new(
        spread * (1.0 - brightness),
        spread,
        brightness * config.depth_strength * radial
            + (uv.x * FLOW_WAVE_NUMBER + time * config.flow_speed).sin()
                * FLOW_SCALE
                * config.flow_amplitude
                * radial,
    );
    let position = base + offset;

    let view_position = inputs.view * position.extend(1.0);
    let point_size = if brightness < DARK_CULL_THRESHOLD {
        0.0
    } else {
        config.particle_size * inputs.frame.pixel_ratio * (SIZE_ATTENUATION / -view_position.z)
    };

    Displaced {
        offset,
        position,
        point_size,
        color,
    }
}

pub fn apply_contrast(color: Vec3, contrast: f32) -> Vec3 {
    (color - 0.5) * contrast + 0.5
}

/// The fragment stage. `point_coord` is the fragment's position within the point's square
/// footprint, in [0, 1] on both axes. Returns `None` outside the inscribed circle.
pub fn shade(color: Vec3, point_coord: Vec2, contrast: f32) -> Option<Vec4> {
    if point_coord.distance(Vec2::splat(0.5)) > 0.5 {
        return None;
    }
    Some(apply_contrast(color, contrast).extend(1.0))
}

/// Projects a displaced particle to normalized device coordinates.
pub fn project(displaced: &Displaced, inputs: &FrameInputs) -> Vec3 {
    let clip = inputs.projection * inputs.view * displaced.position.extend(1.0);
    clip.xyz() / clip.w
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::constants::PLANE_EXTENT;
    use crate::graphics::camera_3d::Camera;
    use crate::images::tests::{BLACK, WHITE, image_from_rows};
    use crate::particles::FrameState;
    use crate::particles::mesh::ParticleMesh;
    use crate::settings::{ConfigKey, RenderConfig};

    fn inputs(config: RenderConfig, time: f32) -> FrameInputs {
        let camera = Camera::new();
        FrameInputs {
            frame: FrameState::new(Duration::from_secs_f32(time), 1.0),
            config,
            view: camera.view(),
            projection: camera.projection(1.0),
            viewport: glam::vec2(1000.0, 1000.0),
        }
    }

    fn particle(u: f32, v: f32) -> ParticleVertex {
        ParticleVertex {
            uv: [u, v],
            position: [(u - 0.5) * PLANE_EXTENT, (v - 0.5) * PLANE_EXTENT, 0.0],
        }
    }

    #[test]
    fn luma_of_white_and_black() {
        assert!((brightness(Vec3::ONE) - 1.0).abs() < 1e-6);
        assert_eq!(brightness(Vec3::ZERO), 0.0);
    }

    #[test]
    fn centre_has_no_radial_weight() {
        assert_eq!(radial_factor(Vec2::splat(0.5)), 0.0);
        assert_eq!(radial_factor(Vec2::new(0.6, 0.4)), 0.0);
    }

    #[test]
    fn corners_have_full_radial_weight() {
        let corner = Vec2::ZERO;
        let normalized = corner.distance(Vec2::splat(0.5)) / CENTER_TO_CORNER;
        assert!((normalized - 1.0).abs() < 1e-3);
        for corner in [Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::ONE] {
            assert!((radial_factor(corner) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn radial_weight_grows_towards_the_edge() {
        let samples: Vec<_> = (0..=10)
            .map(|i| radial_factor(Vec2::new(0.5 + i as f32 * 0.05, 0.5)))
            .collect();
        assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(samples[10] > 0.0);
    }

    #[test]
    fn noise_is_in_unit_interval_and_deterministic() {
        for i in 0..200 {
            let st = Vec2::new(i as f32 * 0.013, 1.0 - i as f32 * 0.007);
            let n = noise(st);
            assert!((0.0..1.0).contains(&n), "noise({st}) = {n}");
            assert_eq!(n, noise(st));
        }
    }

    #[test]
    fn noise_handles_negative_hashes() {
        // sin() is negative here; f32::fract would return a negative value.
        let st = Vec2::new(0.25, 0.0);
        assert!(st.dot(Vec2::new(12.9898, 78.233)).sin() < 0.0);
        assert!(noise(st) >= 0.0);
    }

    #[test]
    fn centre_particle_never_moves() {
        let mut config = RenderConfig::default();
        for &key in ConfigKey::ALL {
            config.set(key, 3.7);
        }
        for time in [0.0, 1.0, 123.0] {
            let displaced = displace(&particle(0.5, 0.5), Vec3::ONE, &inputs(config, time));
            assert_eq!(displaced.offset, Vec3::ZERO);
        }
    }

    #[test]
    fn dark_particles_are_culled() {
        let mut config = RenderConfig::default();
        config.set(ConfigKey::ParticleSize, 50.0);
        for color in [Vec3::ZERO, Vec3::splat(0.049), Vec3::new(0.16, 0.0, 0.0)] {
            for uv in [(0.0, 0.0), (0.5, 0.5), (0.3, 0.9)] {
                let displaced = displace(&particle(uv.0, uv.1), color, &inputs(config, 4.0));
                assert_eq!(displaced.point_size, 0.0);
            }
        }
        let visible = displace(&particle(0.3, 0.9), Vec3::splat(0.06), &inputs(config, 4.0));
        assert!(visible.point_size > 0.0);
    }

    #[test]
    fn brighter_particles_come_forward() {
        let config = RenderConfig::default();
        let dim = displace(&particle(0.0, 0.0), Vec3::splat(0.2), &inputs(config, 0.0));
        let bright = displace(&particle(0.0, 0.0), Vec3::splat(0.9), &inputs(config, 0.0));
        assert!(bright.offset.z > dim.offset.z);
    }

    #[test]
    fn point_size_attenuates_with_distance() {
        let config = RenderConfig::default();
        let near = displace(&particle(0.5, 0.5), Vec3::ONE, &inputs(config, 0.0));
        // Camera sits 4 units in front of the plane.
        assert!((near.point_size - config.particle_size * 10.0 / 4.0).abs() < 1e-4);

        let mut far_particle = particle(0.5, 0.5);
        far_particle.position[2] = -6.0;
        let far = displace(&far_particle, Vec3::ONE, &inputs(config, 0.0));
        assert!((far.point_size - config.particle_size * 10.0 / 10.0).abs() < 1e-4);
    }

    #[test]
    fn flow_wave_travels_with_time() {
        let mut config = RenderConfig::default();
        config.set(ConfigKey::DepthStrength, 0.0);
        config.set(ConfigKey::FlowSpeed, 2.0);
        let p = particle(0.0, 0.0);
        let at_rest = displace(&p, Vec3::ONE, &inputs(config, 0.0));
        let later = displace(&p, Vec3::ONE, &inputs(config, 0.75));
        assert_eq!(at_rest.offset.z, 0.0);
        let expected = (0.75f32 * 2.0).sin() * 0.02 * config.flow_amplitude;
        assert!((later.offset.z - expected).abs() < 1e-6);
    }

    #[test]
    fn contrast_identity_and_half() {
        let color = Vec3::new(0.1, 0.5, 0.93);
        assert!((apply_contrast(color, 1.0) - color).abs().max_element() < 1e-6);
        let halved = apply_contrast(Vec3::new(1.0, 0.0, 0.5), 0.5);
        assert_eq!(halved, Vec3::new(0.75, 0.25, 0.5));
    }

    #[test]
    fn contrast_is_not_clamped() {
        let boosted = apply_contrast(Vec3::ONE, 2.0);
        assert_eq!(boosted, Vec3::splat(1.5));
    }

    #[test]
    fn fragments_outside_circle_are_discarded() {
        let color = Vec3::splat(0.5);
        assert_eq!(shade(color, Vec2::splat(0.5), 1.1), Some(Vec4::new(0.5, 0.5, 0.5, 1.0)));
        assert!(shade(color, Vec2::new(0.5, 0.0), 1.1).is_some());
        assert!(shade(color, Vec2::ZERO, 1.1).is_none());
        assert!(shade(color, Vec2::new(0.95, 0.95), 1.1).is_none());
    }

    #[test]
    fn centre_particle_projects_to_screen_centre() {
        let inputs = inputs(RenderConfig::default(), 0.0);
        let displaced = displace(&particle(0.5, 0.5), Vec3::ONE, &inputs);
        let ndc = project(&displaced, &inputs);
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    /// A 2x2 image, white on the left and black on the right, rendered through a 2x2 mesh.
    #[test]
    fn two_by_two_image_end_to_end() {
        let image = image_from_rows(&[&[WHITE, BLACK], &[WHITE, BLACK]]);
        let mesh = ParticleMesh::new(2, PLANE_EXTENT);
        let config = RenderConfig::default();
        let frame_inputs = inputs(config, 0.0);

        for vertex in mesh.vertices() {
            let uv = Vec2::from_array(vertex.uv);
            let color = image.sample(uv);
            let displaced = displace(vertex, color, &frame_inputs);
            if vertex.uv[0] == 0.0 {
                assert_eq!(color, Vec3::ONE);
                assert!(displaced.point_size > 0.0);
                let expected = config.depth_strength * radial_factor(uv);
                assert!((displaced.offset.z - expected).abs() < 1e-6);
                assert!(displaced.offset.z > 0.0);
                // White doesn't disperse horizontally.
                assert!(displaced.offset.x.abs() < 1e-6);
            } else {
                assert_eq!(color, Vec3::ZERO);
                assert_eq!(displaced.point_size, 0.0);
                // Only the flow ripple moves black particles in depth.
                let flow = (uv.x * 20.0).sin() * 0.02 * config.flow_amplitude * radial_factor(uv);
                assert!((displaced.offset.z - flow).abs() < 1e-6);
            }
        }

        let mut still = config;
        still.set(ConfigKey::FlowAmplitude, 0.0);
        let still_inputs = inputs(still, 0.0);
        for vertex in mesh.vertices().iter().filter(|v| v.uv[0] == 1.0) {
            let color = image.sample(Vec2::from_array(vertex.uv));
            assert_eq!(displace(vertex, color, &still_inputs).offset.z, 0.0);
        }
    }
}
