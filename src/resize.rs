use log::debug;

use crate::camera::CameraRig;

/// Window size as reported by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Physical pixels.
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio of the monitor the window sits on.
    pub scale_factor: f64,
}

impl Viewport {
    pub const fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Pixel size of every full-resolution render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetExtent {
    pub width: u32,
    pub height: u32,
}

impl TargetExtent {
    /// Scales the physical size down when the device ratio exceeds `cap`.
    pub fn from_viewport(viewport: Viewport, cap: f64) -> Self {
        let scale = if viewport.scale_factor > cap && viewport.scale_factor > 0.0 {
            cap / viewport.scale_factor
        } else {
            1.0
        };
        Self {
            width: ((viewport.width as f64 * scale).round() as u32).max(1),
            height: ((viewport.height as f64 * scale).round() as u32).max(1),
        }
    }

    /// Half-resolution size used by the bloom chain.
    pub fn half(self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
        }
    }

    pub fn texel_size(self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }
}

/// Keeps render target size and camera aspect in step with the window.
#[derive(Debug, Clone)]
pub struct ResizeHandler {
    pixel_ratio_cap: f64,
    extent: TargetExtent,
}

impl ResizeHandler {
    pub fn new(pixel_ratio_cap: f64, initial: Viewport) -> Self {
        Self {
            pixel_ratio_cap,
            extent: TargetExtent::from_viewport(initial, pixel_ratio_cap),
        }
    }

    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    /// Applies a window size change.
    ///
    /// Zero-sized viewports (minimised windows) are ignored. The camera
    /// aspect is always refreshed; the new extent is returned only when the
    /// targets actually need to be rebuilt.
    pub fn apply(&mut self, viewport: Viewport, rig: &mut CameraRig) -> Option<TargetExtent> {
        if viewport.is_empty() {
            debug!("ignoring empty viewport {}x{}", viewport.width, viewport.height);
            return None;
        }

        rig.set_aspect(viewport.aspect());

        let extent = TargetExtent::from_viewport(viewport, self.pixel_ratio_cap);
        if extent == self.extent {
            return None;
        }
        debug!(
            "resizing targets {}x{} -> {}x{}",
            self.extent.width, self.extent.height, extent.width, extent.height
        );
        self.extent = extent;
        Some(extent)
    }
}
