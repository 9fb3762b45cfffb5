use std::fmt::Write;

use glam::Vec2;

use crate::camera::CameraRig;
use crate::config::ViewerConfig;
use crate::kernel::{self, KernelSample};
use crate::uniforms;

/// Aspect ratio assumed by the headless probe.
pub const PROBE_ASPECT: f32 = 16.0 / 9.0;

/// Named pixels traced by the headless probe.
pub const PROBE_POINTS: [(&str, Vec2); 4] = [
    ("center", Vec2::new(0.0, 0.0)),
    ("disk", Vec2::new(-0.55, -0.08)),
    ("above", Vec2::new(0.0, 0.8)),
    ("corner", Vec2::new(0.95, 0.95)),
];

/// Traces [`PROBE_POINTS`] from the configured start pose on the CPU.
pub fn probe(config: &ViewerConfig) -> Vec<(&'static str, KernelSample)> {
    let rig = CameraRig::new(&config.camera, PROBE_ASPECT);
    let frame = uniforms::refresh(&rig, 0.0, &config.shader);
    PROBE_POINTS
        .iter()
        .map(|&(name, ndc)| {
            let ray = kernel::primary_ray(&frame, ndc);
            (name, kernel::trace(ray, &config.shader, frame.elapsed))
        })
        .collect()
}

/// Human readable report of the resolved configuration and the probe.
pub fn summary(config: &ViewerConfig) -> String {
    let ViewerConfig {
        camera,
        orbit,
        shader,
        bloom,
        display,
    } = config;
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Black hole viewer configuration");
    let _ = writeln!(
        out,
        " camera: position ({:.2}, {:.2}, {:.2}) fov {:.1} near {} far {}",
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.fov_degrees,
        camera.near,
        camera.far
    );
    let _ = writeln!(
        out,
        " orbit: damping {} rotate {} zoom {} distance [{}, {}]",
        orbit.damping, orbit.rotate_speed, orbit.zoom_speed, orbit.min_distance, orbit.max_distance
    );
    let _ = writeln!(
        out,
        " blackhole: shadow {} disk {}..{} thickness {} intensity {} lensing {} step {}",
        shader.shadow_radius,
        shader.disk_inner_radius,
        shader.disk_outer_radius,
        shader.disk_thickness,
        shader.disk_intensity,
        shader.lensing_strength,
        shader.step_scale
    );
    let _ = writeln!(
        out,
        " ring: radius {} width {} intensity {}",
        shader.ring_radius, shader.ring_width, shader.ring_intensity
    );
    let _ = writeln!(
        out,
        " bloom: strength {} radius {} threshold {}",
        bloom.strength, bloom.radius, bloom.threshold
    );
    let _ = writeln!(
        out,
        " display: exposure {} pixel ratio cap {}",
        display.exposure, display.pixel_ratio_cap
    );

    let _ = writeln!(out, "Kernel probe:");
    for (name, sample) in probe(config) {
        if sample.captured {
            let _ = writeln!(out, " - {name}: captured");
        } else {
            let _ = writeln!(
                out,
                " - {name}: rgb=({:.3}, {:.3}, {:.3}) disk samples {}",
                sample.color.x, sample.color.y, sample.color.z, sample.disk_samples
            );
        }
    }
    out
}

pub fn print_summary(config: &ViewerConfig) {
    print!("{}", summary(config));
}
