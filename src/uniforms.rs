use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::camera::{CameraBasis, CameraRig};
use crate::params::ShaderParameterSet;

/// Everything the raymarch kernel reads for one frame.
///
/// Built fresh every frame after the camera has been updated and dropped
/// once the frame is submitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformFrame {
    /// Seconds since the viewer started.
    pub elapsed: f32,
    pub camera_position: Vec3,
    pub basis: CameraBasis,
    pub aspect: f32,
    pub fov_degrees: f32,
    pub params: ShaderParameterSet,
}

impl UniformFrame {
    /// Unnormalised primary ray direction for a pixel in NDC (`y` up).
    pub fn ray_direction(&self, ndc: Vec2) -> Vec3 {
        let tan_half = (self.fov_degrees.to_radians() * 0.5).tan();
        self.basis.forward
            + tan_half * ndc.y * self.basis.up
            + tan_half * self.aspect * ndc.x * self.basis.right
    }
}

/// Snapshots the camera, the clock and the parameter set.
pub fn refresh(rig: &CameraRig, elapsed: f32, params: &ShaderParameterSet) -> UniformFrame {
    UniformFrame {
        elapsed,
        camera_position: rig.position(),
        basis: rig.basis(),
        aspect: rig.aspect(),
        fov_degrees: rig.fov_degrees(),
        params: *params,
    }
}

/// GPU layout of [`UniformFrame`]; mirrors `FrameUniform` in the raytrace
/// shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    pub camera_position: [f32; 3],
    pub time: f32,
    pub camera_right: [f32; 3],
    pub aspect: f32,
    pub camera_up: [f32; 3],
    pub fov_degrees: f32,
    pub camera_forward: [f32; 3],
    pub step_scale: f32,
    pub shadow_radius: f32,
    pub disk_inner_radius: f32,
    pub disk_outer_radius: f32,
    pub disk_thickness: f32,
    pub disk_intensity: f32,
    pub lensing_strength: f32,
    pub ring_intensity: f32,
    pub ring_radius: f32,
    pub ring_width: f32,
    pub _padding: [f32; 3],
}

impl From<&UniformFrame> for FrameUniform {
    fn from(frame: &UniformFrame) -> Self {
        let params = &frame.params;
        Self {
            camera_position: frame.camera_position.into(),
            time: frame.elapsed,
            camera_right: frame.basis.right.into(),
            aspect: frame.aspect,
            camera_up: frame.basis.up.into(),
            fov_degrees: frame.fov_degrees,
            camera_forward: frame.basis.forward.into(),
            step_scale: params.step_scale,
            shadow_radius: params.shadow_radius,
            disk_inner_radius: params.disk_inner_radius,
            disk_outer_radius: params.disk_outer_radius,
            disk_thickness: params.disk_thickness,
            disk_intensity: params.disk_intensity,
            lensing_strength: params.lensing_strength,
            ring_intensity: params.ring_intensity,
            ring_radius: params.ring_radius,
            ring_width: params.ring_width,
            _padding: [0.0; 3],
        }
    }
}
