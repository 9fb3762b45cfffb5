use crate::error::{require_less, require_non_negative, require_positive, ConfigError};

/// Tunable knobs of the raymarch kernel.
///
/// The set is fixed once the viewer starts; edits happen offline in a
/// tuning file and are validated before the first frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParameterSet {
    /// Radius of the event horizon shadow; rays inside it are black.
    pub shadow_radius: f32,
    pub disk_inner_radius: f32,
    pub disk_outer_radius: f32,
    /// Full height of the emissive slab around the equatorial plane.
    pub disk_thickness: f32,
    pub disk_intensity: f32,
    /// Deflection strength; zero renders straight rays.
    pub lensing_strength: f32,
    /// Photon ring weight; zero disables the ring term.
    pub ring_intensity: f32,
    pub ring_radius: f32,
    pub ring_width: f32,
    /// Scales the integration step length.
    pub step_scale: f32,
}

impl Default for ShaderParameterSet {
    fn default() -> Self {
        Self {
            shadow_radius: 1.24,
            disk_inner_radius: 2.3,
            disk_outer_radius: 8.9,
            disk_thickness: 0.145,
            disk_intensity: 1.18,
            lensing_strength: 2.34,
            ring_intensity: 0.9,
            ring_radius: 1.48,
            ring_width: 0.058,
            step_scale: 0.088,
        }
    }
}

impl ShaderParameterSet {
    /// Checks every field and the radius ordering, reporting the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("shadow-radius", self.shadow_radius)?;
        require_positive("disk-inner-radius", self.disk_inner_radius)?;
        require_positive("disk-outer-radius", self.disk_outer_radius)?;
        require_positive("disk-thickness", self.disk_thickness)?;
        require_positive("disk-intensity", self.disk_intensity)?;
        require_non_negative("lensing-strength", self.lensing_strength)?;
        require_non_negative("ring-intensity", self.ring_intensity)?;
        require_positive("ring-radius", self.ring_radius)?;
        require_positive("ring-width", self.ring_width)?;
        require_positive("step-scale", self.step_scale)?;

        require_less(
            "disk-inner-radius",
            self.disk_inner_radius,
            "disk-outer-radius",
            self.disk_outer_radius,
        )?;
        require_less(
            "shadow-radius",
            self.shadow_radius,
            "disk-inner-radius",
            self.disk_inner_radius,
        )
    }

    /// Largest colour component the kernel can emit for this set.
    pub fn emission_bound(&self) -> f32 {
        self.disk_intensity.max(self.ring_intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ShaderParameterSet::default().validate().unwrap();
    }

    #[test]
    fn inner_radius_must_be_below_outer_radius() {
        let params = ShaderParameterSet {
            disk_inner_radius: 9.0,
            ..ShaderParameterSet::default()
        };
        let err = params.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "disk-inner-radius (9) must be less than disk-outer-radius (8.9)"
        );
    }

    #[test]
    fn shadow_must_sit_inside_the_disk() {
        let params = ShaderParameterSet {
            shadow_radius: 2.3,
            ..ShaderParameterSet::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Ordering {
                lower: "shadow-radius",
                ..
            }
        ));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let params = ShaderParameterSet {
            ring_radius: -1.0,
            ..ShaderParameterSet::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().starts_with("ring-radius must be a positive"));
    }

    #[test]
    fn zero_ring_and_lensing_are_allowed() {
        let params = ShaderParameterSet {
            ring_intensity: 0.0,
            lensing_strength: 0.0,
            ..ShaderParameterSet::default()
        };
        params.validate().unwrap();
    }

    #[test]
    fn nan_is_rejected() {
        let params = ShaderParameterSet {
            step_scale: f32::NAN,
            ..ShaderParameterSet::default()
        };
        assert!(params.validate().is_err());
    }
}
