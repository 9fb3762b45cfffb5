use glam::{Mat4, Vec3};

use crate::config::CameraSettings;
use crate::controls::PoseDelta;

/// Orthonormal right-handed camera frame in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    /// Points from the eye toward the look target.
    pub forward: Vec3,
}

/// Perspective camera that always looks at a fixed target.
///
/// No matrices are cached: every query derives them from the current pose,
/// so a pose change is visible to the very next call.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl CameraRig {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            position: settings.position,
            target: Vec3::ZERO,
            fov_degrees: settings.fov_degrees,
            aspect: if aspect > 0.0 { aspect } else { 1.0 },
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Updates the aspect ratio; non-positive or non-finite values are ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Adopts the eye position produced by the orbit controller.
    pub fn apply(&mut self, delta: &PoseDelta) {
        self.position = delta.eye;
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up_hint())
    }

    /// View-to-world transform; its columns are the camera axes.
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Extracts right/up/forward from a freshly built world transform.
    pub fn basis(&self) -> CameraBasis {
        let world = self.world_matrix();
        CameraBasis {
            right: world.x_axis.truncate().normalize(),
            up: world.y_axis.truncate().normalize(),
            forward: (-world.z_axis.truncate()).normalize(),
        }
    }

    fn up_hint(&self) -> Vec3 {
        let view = (self.target - self.position).normalize_or_zero();
        if view.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        }
    }
}
