use std::path::Path;

use glam::Vec3;
use log::info;
use roxmltree::{Document, Node};

use crate::error::{require_less, require_non_negative, require_positive, ConfigError};
use crate::params::ShaderParameterSet;

/// Initial pose and projection of the viewing camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.55, 10.8),
            fov_degrees: 46.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Orbit controller tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSettings {
    /// Fraction of the pending motion applied per 60 Hz frame.
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            damping: 0.065,
            rotate_speed: 0.5,
            zoom_speed: 0.9,
            min_distance: 5.8,
            max_distance: 18.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    /// Luminance above which pixels start to glow.
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 1.1,
            strength: 0.11,
            radius: 0.28,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    /// Exposure applied before filmic tone mapping.
    pub exposure: f32,
    /// Upper bound on the device pixel ratio used for render targets.
    pub pixel_ratio_cap: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            exposure: 0.94,
            pixel_ratio_cap: 2.0,
        }
    }
}

/// Every start-up constant of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewerConfig {
    pub camera: CameraSettings,
    pub orbit: OrbitSettings,
    pub shader: ShaderParameterSet,
    pub bloom: BloomSettings,
    pub display: DisplaySettings,
}

impl ViewerConfig {
    /// Loads a tuning file and merges it over the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_xml(&xml)?;
        info!("loaded tuning from {}", path.display());
        Ok(config)
    }

    /// Parses a `<viewer>` tuning document and validates the result.
    pub fn from_xml(xml: &str) -> Result<Self, ConfigError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        let mut config = Self::default();

        if let Some(node) = section(&root, "camera") {
            let camera = &mut config.camera;
            camera.position = parse_vec3(&node, "position", camera.position)?;
            camera.fov_degrees = parse_f32(&node, "fov", camera.fov_degrees)?;
            camera.near = parse_f32(&node, "near", camera.near)?;
            camera.far = parse_f32(&node, "far", camera.far)?;
        }

        if let Some(node) = section(&root, "orbit") {
            let orbit = &mut config.orbit;
            orbit.damping = parse_f32(&node, "damping", orbit.damping)?;
            orbit.rotate_speed = parse_f32(&node, "rotate-speed", orbit.rotate_speed)?;
            orbit.zoom_speed = parse_f32(&node, "zoom-speed", orbit.zoom_speed)?;
            orbit.min_distance = parse_f32(&node, "min-distance", orbit.min_distance)?;
            orbit.max_distance = parse_f32(&node, "max-distance", orbit.max_distance)?;
        }

        if let Some(node) = section(&root, "blackhole") {
            let shader = &mut config.shader;
            shader.shadow_radius = parse_f32(&node, "shadow-radius", shader.shadow_radius)?;
            shader.disk_inner_radius =
                parse_f32(&node, "disk-inner-radius", shader.disk_inner_radius)?;
            shader.disk_outer_radius =
                parse_f32(&node, "disk-outer-radius", shader.disk_outer_radius)?;
            shader.disk_thickness = parse_f32(&node, "disk-thickness", shader.disk_thickness)?;
            shader.disk_intensity = parse_f32(&node, "disk-intensity", shader.disk_intensity)?;
            shader.lensing_strength =
                parse_f32(&node, "lensing-strength", shader.lensing_strength)?;
            shader.ring_intensity = parse_f32(&node, "ring-intensity", shader.ring_intensity)?;
            shader.ring_radius = parse_f32(&node, "ring-radius", shader.ring_radius)?;
            shader.ring_width = parse_f32(&node, "ring-width", shader.ring_width)?;
            shader.step_scale = parse_f32(&node, "step-scale", shader.step_scale)?;
        }

        if let Some(node) = section(&root, "bloom") {
            let bloom = &mut config.bloom;
            bloom.threshold = parse_f32(&node, "threshold", bloom.threshold)?;
            bloom.strength = parse_f32(&node, "strength", bloom.strength)?;
            bloom.radius = parse_f32(&node, "radius", bloom.radius)?;
        }

        if let Some(node) = section(&root, "display") {
            let display = &mut config.display;
            display.exposure = parse_f32(&node, "exposure", display.exposure)?;
            display.pixel_ratio_cap =
                parse_f32(&node, "pixel-ratio-cap", display.pixel_ratio_cap as f32)? as f64;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects any inconsistent knob. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !camera.position.is_finite() {
            return Err(ConfigError::out_of_range(
                "camera position",
                "finite",
                f32::NAN,
            ));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::out_of_range(
                "fov",
                "between 0 and 180 degrees",
                camera.fov_degrees,
            ));
        }
        require_positive("near", camera.near)?;
        require_positive("far", camera.far)?;
        require_less("near", camera.near, "far", camera.far)?;

        let orbit = &self.orbit;
        require_positive("damping", orbit.damping)?;
        if orbit.damping > 1.0 {
            return Err(ConfigError::out_of_range(
                "damping",
                "at most 1",
                orbit.damping,
            ));
        }
        require_positive("rotate-speed", orbit.rotate_speed)?;
        require_positive("zoom-speed", orbit.zoom_speed)?;
        require_positive("min-distance", orbit.min_distance)?;
        require_positive("max-distance", orbit.max_distance)?;
        require_less(
            "min-distance",
            orbit.min_distance,
            "max-distance",
            orbit.max_distance,
        )?;
        let distance = camera.position.length();
        if distance < orbit.min_distance || distance > orbit.max_distance {
            return Err(ConfigError::out_of_range(
                "camera distance",
                "within the orbit distance bounds",
                distance,
            ));
        }

        self.shader.validate()?;

        require_non_negative("threshold", self.bloom.threshold)?;
        require_non_negative("strength", self.bloom.strength)?;
        require_non_negative("radius", self.bloom.radius)?;

        require_positive("exposure", self.display.exposure)?;
        require_positive("pixel-ratio-cap", self.display.pixel_ratio_cap as f32)
    }
}

fn section<'a, 'input>(root: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    root.children().find(|child| child.has_tag_name(tag))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_f32(node: &Node<'_, '_>, tag: &str, default: f32) -> Result<f32, ConfigError> {
    match optional_text(node, tag) {
        Some(value) => value.parse::<f32>().map_err(|_| ConfigError::NotANumber {
            field: tag.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_vec3(node: &Node<'_, '_>, tag: &str, default: Vec3) -> Result<Vec3, ConfigError> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(|component| component.parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::NotANumber {
            field: tag.to_string(),
            value: value.clone(),
        })?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(ConfigError::Components {
            field: tag.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    static SAMPLE: Lazy<String> = Lazy::new(|| {
        r#"
        <viewer>
            <camera>
                <position>0 3 12</position>
                <fov>50</fov>
            </camera>
            <blackhole>
                <disk-intensity>1.5</disk-intensity>
                <ring-intensity>0</ring-intensity>
            </blackhole>
            <bloom>
                <threshold>0.9</threshold>
            </bloom>
            <display>
                <pixel-ratio-cap>1.5</pixel-ratio-cap>
            </display>
        </viewer>
        "#
        .to_string()
    });

    #[test]
    fn defaults_pass_validation() {
        ViewerConfig::default().validate().unwrap();
    }

    #[test]
    fn xml_overrides_only_named_fields() {
        let config = ViewerConfig::from_xml(&SAMPLE).unwrap();
        assert_eq!(config.camera.position, Vec3::new(0.0, 3.0, 12.0));
        assert_eq!(config.camera.fov_degrees, 50.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.shader.disk_intensity, 1.5);
        assert_eq!(config.shader.ring_intensity, 0.0);
        assert_eq!(config.shader.disk_inner_radius, 2.3);
        assert_eq!(config.bloom.threshold, 0.9);
        assert_eq!(config.bloom.strength, 0.11);
        assert_eq!(config.display.pixel_ratio_cap, 1.5);
        assert_eq!(config.orbit, OrbitSettings::default());
    }

    #[test]
    fn empty_viewer_yields_defaults() {
        let config = ViewerConfig::from_xml("<viewer/>").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn invalid_number_names_the_field() {
        let err = ViewerConfig::from_xml(
            "<viewer><blackhole><ring-width>wide</ring-width></blackhole></viewer>",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "<ring-width> is not a number: \"wide\"");
    }

    #[test]
    fn short_vector_is_rejected() {
        let err = ViewerConfig::from_xml(
            "<viewer><camera><position>0 1</position></camera></viewer>",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Components { .. }));
    }

    #[test]
    fn parameter_invariants_fail_fast() {
        let err = ViewerConfig::from_xml(
            "<viewer><blackhole><disk-outer-radius>2.0</disk-outer-radius></blackhole></viewer>",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "disk-inner-radius (2.3) must be less than disk-outer-radius (2)"
        );
    }

    #[test]
    fn camera_outside_orbit_bounds_is_rejected() {
        let err = ViewerConfig::from_xml(
            "<viewer><camera><position>0 0 40</position></camera></viewer>",
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("camera distance must be within"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_xml("<viewer>"),
            Err(ConfigError::Xml(_))
        ));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut tmp = NamedTempFile::new().expect("tmp file");
        tmp.write_all(SAMPLE.as_bytes()).expect("write tuning");
        let config = ViewerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.shader.disk_intensity, 1.5);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ViewerConfig::load("/nonexistent/tuning.xml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tuning.xml"));
    }
}
