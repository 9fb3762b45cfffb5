use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::config::OrbitSettings;
use crate::input::{PointerButton, PointerEvent, PointerState};

/// Keeps the polar angle away from the poles so the camera frame never
/// degenerates.
const POLAR_EPSILON: f32 = 1e-3;
/// Damping factors are tuned per frame at this rate.
const REFERENCE_RATE: f32 = 60.0;
/// Zoom scale per wheel notch before `zoom_speed` is applied.
const ZOOM_BASE: f32 = 0.95;

/// Pose change produced by one controller update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseDelta {
    pub previous: Vec3,
    /// Eye position the camera should adopt.
    pub eye: Vec3,
}

impl PoseDelta {
    pub fn translation(&self) -> Vec3 {
        self.eye - self.previous
    }

    pub fn is_still(&self) -> bool {
        self.translation().length_squared() <= f32::EPSILON * f32::EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Idle,
    Rotate,
    Dolly,
}

/// Damped orbit around a fixed target.
///
/// Left drag rotates, middle drag and the wheel zoom, the right button is
/// swallowed. There is no panning: the target never moves.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    settings: OrbitSettings,
    target: Vec3,
    radius: f32,
    goal_radius: f32,
    /// Angle around +Y, measured from +Z.
    azimuth: f32,
    /// Angle from +Y.
    polar: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pointer: PointerState,
    mode: DragMode,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings, eye: Vec3) -> Self {
        let target = Vec3::ZERO;
        let offset = eye - target;
        let radius = offset
            .length()
            .clamp(settings.min_distance, settings.max_distance);
        let azimuth = offset.x.atan2(offset.z);
        let polar = if offset.length_squared() > 0.0 {
            (offset.y / offset.length()).clamp(-1.0, 1.0).acos()
        } else {
            PI * 0.5
        };
        Self {
            settings,
            target,
            radius,
            goal_radius: radius,
            azimuth,
            polar: polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON),
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pointer: PointerState::new(),
            mode: DragMode::Idle,
            viewport_height: 1.0,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    /// Height in physical pixels used to turn drags into angles.
    pub fn set_viewport_height(&mut self, height: f32) {
        if height > 0.0 {
            self.viewport_height = height;
        }
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Pressed(button) => {
                self.pointer.press(button);
                self.mode = match button {
                    PointerButton::Primary => DragMode::Rotate,
                    PointerButton::Middle => DragMode::Dolly,
                    PointerButton::Secondary | PointerButton::Other(_) => self.mode,
                };
            }
            PointerEvent::Released(button) => {
                self.pointer.release(button);
                let still_held = match self.mode {
                    DragMode::Rotate => self.pointer.is_down(PointerButton::Primary),
                    DragMode::Dolly => self.pointer.is_down(PointerButton::Middle),
                    DragMode::Idle => false,
                };
                if !still_held {
                    self.mode = DragMode::Idle;
                }
            }
            PointerEvent::Moved(position) => {
                let delta = self.pointer.move_to(position);
                match self.mode {
                    DragMode::Rotate => self.rotate(delta),
                    DragMode::Dolly => {
                        if delta.y > 0.0 {
                            self.dolly_out();
                        } else if delta.y < 0.0 {
                            self.dolly_in();
                        }
                    }
                    DragMode::Idle => {}
                }
            }
            PointerEvent::Scroll(notches) => {
                if notches > 0.0 {
                    self.dolly_in();
                } else if notches < 0.0 {
                    self.dolly_out();
                }
            }
        }
    }

    /// Advances the damped motion by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> PoseDelta {
        let previous = self.eye();
        let blend = 1.0 - (1.0 - self.settings.damping).powf(dt.max(0.0) * REFERENCE_RATE);

        self.azimuth = (self.azimuth + self.pending_azimuth * blend) % TAU;
        self.polar = (self.polar + self.pending_polar * blend)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.pending_azimuth *= 1.0 - blend;
        self.pending_polar *= 1.0 - blend;

        self.radius = (self.radius + (self.goal_radius - self.radius) * blend)
            .clamp(self.settings.min_distance, self.settings.max_distance);

        PoseDelta {
            previous,
            eye: self.eye(),
        }
    }

    fn rotate(&mut self, delta: Vec2) {
        let per_pixel = TAU / self.viewport_height * self.settings.rotate_speed;
        self.pending_azimuth -= delta.x * per_pixel;
        self.pending_polar -= delta.y * per_pixel;
    }

    fn zoom_scale(&self) -> f32 {
        ZOOM_BASE.powf(self.settings.zoom_speed)
    }

    fn dolly_in(&mut self) {
        self.goal_radius = (self.goal_radius * self.zoom_scale())
            .clamp(self.settings.min_distance, self.settings.max_distance);
    }

    fn dolly_out(&mut self) {
        self.goal_radius = (self.goal_radius / self.zoom_scale())
            .clamp(self.settings.min_distance, self.settings.max_distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn controls() -> OrbitControls {
        let mut controls = OrbitControls::new(OrbitSettings::default(), Vec3::new(0.0, 2.55, 10.8));
        controls.set_viewport_height(600.0);
        controls
    }

    fn drag(controls: &mut OrbitControls, button: PointerButton, from: Vec2, to: Vec2) {
        controls.handle(PointerEvent::Moved(from));
        controls.handle(PointerEvent::Pressed(button));
        controls.handle(PointerEvent::Moved(to));
        controls.handle(PointerEvent::Released(button));
    }

    #[test]
    fn eye_round_trips_initial_position() {
        let controls = controls();
        assert!((controls.eye() - Vec3::new(0.0, 2.55, 10.8)).length() < 1e-4);
    }

    #[test]
    fn zoom_in_never_passes_min_distance() {
        let mut controls = controls();
        for _ in 0..500 {
            controls.handle(PointerEvent::Scroll(1.0));
            let pose = controls.update(FRAME);
            assert!(pose.eye.length() >= 5.8 - 1e-4);
        }
        assert!((controls.distance() - 5.8).abs() < 1e-3);
    }

    #[test]
    fn zoom_out_never_passes_max_distance() {
        let mut controls = controls();
        for _ in 0..500 {
            controls.handle(PointerEvent::Scroll(-1.0));
            let pose = controls.update(FRAME);
            assert!(pose.eye.length() <= 18.5 + 1e-4);
        }
        assert!((controls.distance() - 18.5).abs() < 1e-3);
    }

    #[test]
    fn motion_is_damped_not_snapped() {
        let mut controls = controls();
        let start = controls.eye();
        drag(
            &mut controls,
            PointerButton::Primary,
            Vec2::new(300.0, 300.0),
            Vec2::new(400.0, 300.0),
        );
        let first = controls.update(FRAME);
        let first_step = first.translation().length();
        assert!(first_step > 0.0);

        let mut last = first;
        for _ in 0..600 {
            last = controls.update(FRAME);
        }
        let total = (last.eye - start).length();
        assert!(first_step < total * 0.2);
        assert!(last.is_still());
        // Rotation keeps the orbit radius.
        assert!((last.eye.length() - start.length()).abs() < 1e-3);
    }

    #[test]
    fn right_button_is_suppressed() {
        let mut controls = controls();
        let start = controls.eye();
        drag(
            &mut controls,
            PointerButton::Secondary,
            Vec2::new(100.0, 100.0),
            Vec2::new(400.0, 350.0),
        );
        for _ in 0..120 {
            controls.update(FRAME);
        }
        assert!((controls.eye() - start).length() < 1e-5);
    }

    #[test]
    fn middle_drag_dollies() {
        let mut controls = controls();
        let start = controls.distance();
        drag(
            &mut controls,
            PointerButton::Middle,
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 80.0),
        );
        for _ in 0..600 {
            controls.update(FRAME);
        }
        assert!(controls.distance() < start);
    }

    #[test]
    fn vertical_drag_is_clamped_at_the_pole() {
        let mut controls = controls();
        drag(
            &mut controls,
            PointerButton::Primary,
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 5000.0),
        );
        for _ in 0..600 {
            let pose = controls.update(FRAME);
            assert!(pose.eye.is_finite());
        }
        let eye = controls.eye();
        assert!(eye.y.abs() < eye.length());
    }

    #[test]
    fn damping_is_refresh_rate_independent() {
        let mut slow = controls();
        let mut fast = controls();
        for controls in [&mut slow, &mut fast] {
            drag(
                controls,
                PointerButton::Primary,
                Vec2::new(300.0, 300.0),
                Vec2::new(360.0, 300.0),
            );
        }
        for _ in 0..30 {
            slow.update(1.0 / 30.0);
        }
        for _ in 0..120 {
            fast.update(1.0 / 120.0);
        }
        assert!((slow.eye() - fast.eye()).length() < 1e-3);
    }

    #[test]
    fn zero_dt_leaves_pose_unchanged() {
        let mut controls = controls();
        controls.handle(PointerEvent::Scroll(1.0));
        assert!(controls.update(0.0).is_still());
    }
}
