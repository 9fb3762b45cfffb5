use glam::Vec3;

use crate::kernel;

/// Builds the raytrace shader with the integrator constants shared with
/// [`crate::kernel`].
pub fn raytrace_source() -> String {
    let mut source = String::with_capacity(RAYTRACE_BODY.len() + 1024);
    source.push_str(&format!(
        "const MAX_STEPS: u32 = {}u;\n",
        kernel::MAX_STEPS
    ));
    for (name, value) in [
        ("ESCAPE_RADIUS", kernel::ESCAPE_RADIUS),
        ("LENSING_CUTOFF", kernel::LENSING_CUTOFF),
        ("MIN_RADIUS", kernel::MIN_RADIUS),
        ("DISK_DENSITY", kernel::DISK_DENSITY),
        ("RING_DENSITY", kernel::RING_DENSITY),
        ("TRANSMITTANCE_FLOOR", kernel::TRANSMITTANCE_FLOOR),
        ("SWIRL_ARMS", kernel::SWIRL_ARMS),
        ("SWIRL_SPEED", kernel::SWIRL_SPEED),
    ] {
        source.push_str(&format!("const {name}: f32 = {value:?};\n"));
    }
    for (name, value) in [
        ("DISK_INNER_COLOR", kernel::DISK_INNER_COLOR),
        ("DISK_OUTER_COLOR", kernel::DISK_OUTER_COLOR),
        ("RING_COLOR", kernel::RING_COLOR),
    ] {
        source.push_str(&format!("const {name}: vec3<f32> = {};\n", wgsl_vec3(value)));
    }
    source.push_str(RAYTRACE_BODY);
    source
}

fn wgsl_vec3(value: Vec3) -> String {
    format!("vec3<f32>({:?}, {:?}, {:?})", value.x, value.y, value.z)
}

const RAYTRACE_BODY: &str = r#"
struct FrameUniform {
    camera_position: vec3<f32>,
    time: f32,
    camera_right: vec3<f32>,
    aspect: f32,
    camera_up: vec3<f32>,
    fov_degrees: f32,
    camera_forward: vec3<f32>,
    step_scale: f32,
    shadow_radius: f32,
    disk_inner_radius: f32,
    disk_outer_radius: f32,
    disk_thickness: f32,
    disk_intensity: f32,
    lensing_strength: f32,
    ring_intensity: f32,
    ring_radius: f32,
    ring_width: f32,
    _padding0: f32,
    _padding1: f32,
    _padding2: f32,
}

@group(0) @binding(0)
var<uniform> frame: FrameUniform;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var output: VertexOutput;
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    let ndc = vec2<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0);
    output.position = vec4<f32>(ndc, 0.0, 1.0);
    output.ndc = ndc;
    return output;
}

struct Medium {
    density: f32,
    emission: vec3<f32>,
}

fn disk_falloff(radius: f32) -> f32 {
    let inner = frame.disk_inner_radius;
    let span = frame.disk_outer_radius - inner;
    let t = clamp((radius - inner) / span, 0.0, 1.0);
    return pow(inner / max(radius, inner), 1.5) * (1.0 - t);
}

fn disk_emission(position: vec3<f32>, radius: f32) -> vec3<f32> {
    let falloff = disk_falloff(radius);
    let azimuth = atan2(position.z, position.x);
    let swirl = 0.8 + 0.2 * sin(SWIRL_ARMS * azimuth - frame.time * SWIRL_SPEED);
    return mix(DISK_OUTER_COLOR, DISK_INNER_COLOR, falloff) * falloff * frame.disk_intensity * swirl;
}

fn sample_medium(position: vec3<f32>, radius: f32) -> Medium {
    var density = 0.0;
    var weighted = vec3<f32>(0.0);

    let in_disk = abs(position.y) <= frame.disk_thickness * 0.5
        && radius >= frame.disk_inner_radius
        && radius <= frame.disk_outer_radius;
    if (in_disk) {
        density += DISK_DENSITY;
        weighted += disk_emission(position, radius) * DISK_DENSITY;
    }

    if (frame.ring_intensity > 0.0) {
        let half_width = frame.ring_width * 0.5;
        let profile = max(1.0 - abs(radius - frame.ring_radius) / half_width, 0.0);
        if (profile > 0.0) {
            density += RING_DENSITY;
            weighted += RING_COLOR * frame.ring_intensity * profile * RING_DENSITY;
        }
    }

    var medium: Medium;
    medium.density = density;
    medium.emission = vec3<f32>(0.0);
    if (density > 0.0) {
        medium.emission = weighted / density;
    }
    return medium;
}

fn step_length(position: vec3<f32>, radius: f32) -> f32 {
    let base = frame.step_scale * clamp(radius * 0.5, 0.5, 2.0);
    if (radius > frame.disk_outer_radius + base) {
        return base;
    }
    let to_slab = max(abs(position.y) - frame.disk_thickness * 0.5, 0.0);
    return min(base, max(to_slab, frame.disk_thickness * 0.25));
}

fn trace(origin: vec3<f32>, initial_direction: vec3<f32>) -> vec3<f32> {
    var position = origin;
    var direction = initial_direction;
    var color = vec3<f32>(0.0);
    var transmittance = 1.0;

    var radius = max(length(position), MIN_RADIUS);
    if (radius < frame.shadow_radius) {
        return vec3<f32>(0.0);
    }

    for (var i = 0u; i < MAX_STEPS; i = i + 1u) {
        if (radius > ESCAPE_RADIUS && dot(position, direction) > 0.0) {
            break;
        }

        let step_len = step_length(position, radius);
        let lensing = 1.0 - smoothstep(LENSING_CUTOFF * 0.6, LENSING_CUTOFF, radius);
        let pull = frame.lensing_strength / (radius * radius) * lensing;
        let bent = direction - (position / radius) * pull * step_len;
        let bent_length_squared = dot(bent, bent);
        if (bent_length_squared > 1e-12) {
            direction = bent * inverseSqrt(bent_length_squared);
        }
        position += direction * step_len;

        radius = max(length(position), MIN_RADIUS);
        if (radius < frame.shadow_radius) {
            return vec3<f32>(0.0);
        }

        let medium = sample_medium(position, radius);
        if (medium.density > 0.0) {
            let absorbed = 1.0 - exp(-medium.density * step_len);
            color += medium.emission * absorbed * transmittance;
            transmittance *= 1.0 - absorbed;
            if (transmittance < TRANSMITTANCE_FLOOR) {
                break;
            }
        }
    }

    return color;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let tan_half = tan(radians(frame.fov_degrees) * 0.5);
    let direction = normalize(
        frame.camera_forward
            + tan_half * input.ndc.y * frame.camera_up
            + tan_half * frame.aspect * input.ndc.x * frame.camera_right
    );
    return vec4<f32>(trace(frame.camera_position, direction), 1.0);
}
"#;

/// Bloom and presentation stages. Every entry point samples binding 0
/// through binding 1 and reads its knobs from the `PostParams` uniform.
pub const POST_SHADER: &str = r#"
struct PostParams {
    texel_size: vec2<f32>,
    direction: vec2<f32>,
    threshold: f32,
    strength: f32,
    radius: f32,
    exposure: f32,
    encode_srgb: u32,
    _padding0: u32,
    _padding1: u32,
    _padding2: u32,
}

@group(0) @binding(0) var source_texture: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;
@group(0) @binding(2) var<uniform> params: PostParams;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_fullscreen(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var output: VertexOutput;
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    output.position = vec4<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0, 0.0, 1.0);
    output.uv = vec2<f32>(x, 1.0 - y);
    return output;
}

@fragment
fn fs_extract(input: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(source_texture, source_sampler, input.uv).rgb;
    let luminance = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let weight = max(luminance - params.threshold, 0.0) / max(luminance, 0.0001);
    return vec4<f32>(color * weight, 1.0);
}

@fragment
fn fs_blur(input: VertexOutput) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    let stride = params.direction * params.texel_size * (1.0 + params.radius * 3.0);
    var color = textureSample(source_texture, source_sampler, input.uv).rgb * weights[0];
    for (var i = 1; i < 5; i = i + 1) {
        let offset = stride * f32(i);
        color += textureSample(source_texture, source_sampler, input.uv + offset).rgb * weights[i];
        color += textureSample(source_texture, source_sampler, input.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_composite(input: VertexOutput) -> @location(0) vec4<f32> {
    let bloom = textureSample(source_texture, source_sampler, input.uv).rgb;
    return vec4<f32>(bloom * params.strength, 0.0);
}

fn aces_filmic(color: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return saturate((color * (a * color + b)) / (color * (c * color + d) + e));
}

fn linear_to_srgb(color: vec3<f32>) -> vec3<f32> {
    let low = color * 12.92;
    let high = 1.055 * pow(color, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(high, low, color <= vec3<f32>(0.0031308));
}

@fragment
fn fs_present(input: VertexOutput) -> @location(0) vec4<f32> {
    let hdr = textureSample(source_texture, source_sampler, input.uv).rgb * params.exposure;
    var mapped = aces_filmic(hdr);
    if (params.encode_srgb != 0u) {
        mapped = linear_to_srgb(mapped);
    }
    return vec4<f32>(mapped, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("{err:?}"));
    }

    #[test]
    fn raytrace_shader_validates() {
        validate(&raytrace_source());
    }

    #[test]
    fn post_shader_validates() {
        validate(POST_SHADER);
    }

    #[test]
    fn kernel_constants_are_injected() {
        let source = raytrace_source();
        assert!(source.contains("const MAX_STEPS: u32 = 360u;"));
        assert!(source.contains("const MIN_RADIUS: f32 = 0.0001;"));
        assert!(source.contains("const DISK_INNER_COLOR: vec3<f32> = vec3<f32>(1.0, 0.88, 0.66);"));
    }
}
