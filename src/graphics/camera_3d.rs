use std::f32::consts::TAU;

use crate::constants::{
    CAMERA_AUTO_ROTATE_SPEED, CAMERA_DISTANCE, CAMERA_FAR, CAMERA_FOV_Y_DEGREES, CAMERA_NEAR,
};

/// A perspective camera orbiting the origin in the horizontal plane, always looking at the
/// centre of the particle plane.
pub struct Camera {
    /// Angle around the vertical axis, in radians. Zero looks straight down -z at the plane.
    azimuth: f32,
    auto_rotate: bool,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            azimuth: 0.0,
            auto_rotate: true,
        }
    }

    /// Advances the auto-rotation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.auto_rotate {
            self.azimuth = (self.azimuth + dt * CAMERA_AUTO_ROTATE_SPEED) % TAU;
        }
    }

    pub fn toggle_auto_rotate(&mut self) {
        self.auto_rotate = !self.auto_rotate;
        log::info!(
            "auto-rotation {}",
            if self.auto_rotate { "on" } else { "off" }
        );
    }

    pub fn eye(&self) -> glam::Vec3 {
        glam::vec3(self.azimuth.sin(), 0.0, self.azimuth.cos()) * CAMERA_DISTANCE
    }

    pub fn view(&self) -> glam::Mat4 {
        glam::Mat4::look_at_rh(self.eye(), glam::Vec3::ZERO, glam::Vec3::Y)
    }

    /// wgpu-style projection (depth in [0, 1]) for a surface with the given width / height.
    pub fn projection(&self, aspect: f32) -> glam::Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        glam::Mat4::perspective_rh(
            CAMERA_FOV_Y_DEGREES.to_radians(),
            aspect,
            CAMERA_NEAR,
            CAMERA_FAR,
        )
    }
}
