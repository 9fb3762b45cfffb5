//! CPU mirror of the raymarch kernel.
//!
//! The WGSL integrator in `render::shaders` is generated with the constants
//! below and follows the same step-by-step logic, so this module is the
//! executable reference for what the GPU draws.

use glam::{Vec2, Vec3};

use crate::params::ShaderParameterSet;
use crate::uniforms::UniformFrame;

pub const MAX_STEPS: u32 = 360;
/// Rays leaving this sphere are treated as escaped.
pub const ESCAPE_RADIUS: f32 = 42.0;
/// Deflection fades out between 60% of this radius and the radius itself.
pub const LENSING_CUTOFF: f32 = 30.0;
/// Guards every division by the distance to the singularity.
pub const MIN_RADIUS: f32 = 1e-4;
pub const DISK_DENSITY: f32 = 16.0;
pub const RING_DENSITY: f32 = 22.0;
/// Integration stops once the ray is this opaque.
pub const TRANSMITTANCE_FLOOR: f32 = 0.004;
pub const SWIRL_ARMS: f32 = 3.0;
pub const SWIRL_SPEED: f32 = 0.35;
pub const DISK_INNER_COLOR: Vec3 = Vec3::new(1.0, 0.88, 0.66);
pub const DISK_OUTER_COLOR: Vec3 = Vec3::new(0.95, 0.38, 0.08);
pub const RING_COLOR: Vec3 = Vec3::new(1.0, 0.82, 0.58);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Result of tracing one primary ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelSample {
    /// Linear HDR radiance.
    pub color: Vec3,
    /// The ray fell inside the shadow radius.
    pub captured: bool,
    /// Number of integration steps that landed inside the disk slab.
    pub disk_samples: u32,
}

/// Primary ray through a pixel given in NDC (`y` up).
pub fn primary_ray(frame: &UniformFrame, ndc: Vec2) -> Ray {
    Ray {
        origin: frame.camera_position,
        direction: frame.ray_direction(ndc).normalize(),
    }
}

/// Radial brightness profile of the disk: one at the inner edge, falling
/// monotonically to zero at the outer edge.
pub fn disk_falloff(radius: f32, params: &ShaderParameterSet) -> f32 {
    let inner = params.disk_inner_radius;
    let span = params.disk_outer_radius - inner;
    let t = ((radius - inner) / span).clamp(0.0, 1.0);
    (inner / radius.max(inner)).powf(1.5) * (1.0 - t)
}

fn disk_emission(position: Vec3, radius: f32, params: &ShaderParameterSet, time: f32) -> Vec3 {
    let falloff = disk_falloff(radius, params);
    let azimuth = position.z.atan2(position.x);
    let swirl = 0.8 + 0.2 * (SWIRL_ARMS * azimuth - time * SWIRL_SPEED).sin();
    DISK_OUTER_COLOR.lerp(DISK_INNER_COLOR, falloff) * falloff * params.disk_intensity * swirl
}

fn ring_profile(radius: f32, params: &ShaderParameterSet) -> f32 {
    let half_width = params.ring_width * 0.5;
    (1.0 - (radius - params.ring_radius).abs() / half_width).max(0.0)
}

struct Medium {
    density: f32,
    emission: Vec3,
    in_disk: bool,
}

fn sample_medium(position: Vec3, radius: f32, params: &ShaderParameterSet, time: f32) -> Medium {
    let mut density = 0.0;
    let mut weighted = Vec3::ZERO;

    let in_disk = position.y.abs() <= params.disk_thickness * 0.5
        && radius >= params.disk_inner_radius
        && radius <= params.disk_outer_radius;
    if in_disk {
        density += DISK_DENSITY;
        weighted += disk_emission(position, radius, params, time) * DISK_DENSITY;
    }

    if params.ring_intensity > 0.0 {
        let profile = ring_profile(radius, params);
        if profile > 0.0 {
            density += RING_DENSITY;
            weighted += RING_COLOR * params.ring_intensity * profile * RING_DENSITY;
        }
    }

    let emission = if density > 0.0 {
        weighted / density
    } else {
        Vec3::ZERO
    };
    Medium {
        density,
        emission,
        in_disk,
    }
}

fn lensing_falloff(radius: f32) -> f32 {
    1.0 - smoothstep(LENSING_CUTOFF * 0.6, LENSING_CUTOFF, radius)
}

fn step_length(position: Vec3, radius: f32, params: &ShaderParameterSet) -> f32 {
    let base = params.step_scale * (radius * 0.5).clamp(0.5, 2.0);
    if radius > params.disk_outer_radius + base {
        return base;
    }
    let half_thickness = params.disk_thickness * 0.5;
    let to_slab = (position.y.abs() - half_thickness).max(0.0);
    base.min(to_slab.max(params.disk_thickness * 0.25))
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Integrates one ray through the lensing field, the disk and the photon
/// ring.
pub fn trace(ray: Ray, params: &ShaderParameterSet, time: f32) -> KernelSample {
    let mut position = ray.origin;
    let mut direction = normalize_or(ray.direction, Vec3::NEG_Z);
    let mut color = Vec3::ZERO;
    let mut transmittance = 1.0;
    let mut disk_samples = 0;

    let captured = KernelSample {
        color: Vec3::ZERO,
        captured: true,
        disk_samples: 0,
    };

    let mut radius = position.length().max(MIN_RADIUS);
    if radius < params.shadow_radius {
        return captured;
    }

    for _ in 0..MAX_STEPS {
        if radius > ESCAPE_RADIUS && position.dot(direction) > 0.0 {
            break;
        }

        let step = step_length(position, radius, params);
        let pull = params.lensing_strength / (radius * radius) * lensing_falloff(radius);
        let bent = direction - (position / radius) * pull * step;
        direction = normalize_or(bent, direction);
        position += direction * step;

        radius = position.length().max(MIN_RADIUS);
        if radius < params.shadow_radius {
            return KernelSample {
                disk_samples,
                ..captured
            };
        }

        let medium = sample_medium(position, radius, params, time);
        if medium.in_disk {
            disk_samples += 1;
        }
        if medium.density > 0.0 {
            let absorbed = 1.0 - (-medium.density * step).exp();
            color += medium.emission * absorbed * transmittance;
            transmittance *= 1.0 - absorbed;
            if transmittance < TRANSMITTANCE_FLOOR {
                break;
            }
        }
    }

    KernelSample {
        color,
        captured: false,
        disk_samples,
    }
}

fn normalize_or(vector: Vec3, fallback: Vec3) -> Vec3 {
    let length_squared = vector.length_squared();
    if length_squared > 1e-12 {
        vector / length_squared.sqrt()
    } else {
        fallback
    }
}
