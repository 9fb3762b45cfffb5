use std::time::{Duration, Instant};

use crate::camera::CameraRig;
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::input::PointerEvent;
use crate::params::ShaderParameterSet;
use crate::resize::{ResizeHandler, TargetExtent, Viewport};
use crate::uniforms::{self, UniformFrame};

/// Anything that can consume a frame: the GPU renderer in the binary, a
/// recorder in tests.
pub trait FrameTarget {
    type Error;

    /// Called when the render target extent changes.
    fn resize(&mut self, extent: TargetExtent);

    fn draw(&mut self, frame: &UniformFrame) -> Result<(), Self::Error>;
}

/// Monotonic seconds since the viewer started.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Per-frame driver.
///
/// Each tick updates the controller, moves the camera, snapshots the
/// uniforms and hands them to the target, in that order, so the frame
/// always shows the pose computed for it.
pub struct FrameLoop {
    clock: FrameClock,
    rig: CameraRig,
    controls: OrbitControls,
    params: ShaderParameterSet,
    resize: ResizeHandler,
    last_elapsed: Option<f32>,
}

impl FrameLoop {
    pub fn new(config: &ViewerConfig, viewport: Viewport) -> Self {
        let rig = CameraRig::new(&config.camera, viewport.aspect());
        let mut controls = OrbitControls::new(config.orbit, rig.position());
        controls.set_viewport_height(viewport.height as f32);
        Self {
            clock: FrameClock::start(),
            rig,
            controls,
            params: config.shader,
            resize: ResizeHandler::new(config.display.pixel_ratio_cap, viewport),
            last_elapsed: None,
        }
    }

    pub fn extent(&self) -> TargetExtent {
        self.resize.extent()
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn params(&self) -> &ShaderParameterSet {
        &self.params
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.controls.handle(event);
    }

    /// Forwards a window size change; returns whether the target was
    /// resized.
    pub fn resize<T: FrameTarget>(&mut self, viewport: Viewport, target: &mut T) -> bool {
        if !viewport.is_empty() {
            self.controls.set_viewport_height(viewport.height as f32);
        }
        match self.resize.apply(viewport, &mut self.rig) {
            Some(extent) => {
                target.resize(extent);
                true
            }
            None => false,
        }
    }

    /// Runs one frame at the current clock time.
    pub fn tick<T: FrameTarget>(&mut self, target: &mut T) -> Result<UniformFrame, T::Error> {
        let elapsed = self.clock.elapsed().as_secs_f32();
        self.tick_at(elapsed, target)
    }

    /// Runs one frame as if `elapsed` seconds had passed since start.
    pub fn tick_at<T: FrameTarget>(
        &mut self,
        elapsed: f32,
        target: &mut T,
    ) -> Result<UniformFrame, T::Error> {
        let dt = self
            .last_elapsed
            .map_or(0.0, |last| (elapsed - last).max(0.0));
        self.last_elapsed = Some(elapsed);

        let pose = self.controls.update(dt);
        self.rig.apply(&pose);
        let frame = uniforms::refresh(&self.rig, elapsed, &self.params);
        target.draw(&frame)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::input::PointerButton;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<UniformFrame>,
        extents: Vec<TargetExtent>,
        fail: bool,
    }

    impl FrameTarget for Recorder {
        type Error = &'static str;

        fn resize(&mut self, extent: TargetExtent) {
            self.extents.push(extent);
        }

        fn draw(&mut self, frame: &UniformFrame) -> Result<(), Self::Error> {
            if self.fail {
                return Err("surface lost");
            }
            self.frames.push(*frame);
            Ok(())
        }
    }

    fn frame_loop() -> FrameLoop {
        FrameLoop::new(&ViewerConfig::default(), Viewport::new(800, 600, 1.0))
    }

    #[test]
    fn drawn_frame_uses_the_updated_pose() {
        let mut frames = frame_loop();
        let mut recorder = Recorder::default();
        frames.tick_at(0.0, &mut recorder).unwrap();

        frames.handle_pointer(PointerEvent::Moved(Vec2::new(100.0, 300.0)));
        frames.handle_pointer(PointerEvent::Pressed(PointerButton::Primary));
        frames.handle_pointer(PointerEvent::Moved(Vec2::new(200.0, 300.0)));
        frames.handle_pointer(PointerEvent::Released(PointerButton::Primary));

        let frame = frames.tick_at(1.0 / 60.0, &mut recorder).unwrap();
        assert_eq!(frame.camera_position, frames.rig().position());
        assert_ne!(recorder.frames[0].camera_position, frame.camera_position);
        assert_eq!(recorder.frames[1], frame);
    }

    #[test]
    fn elapsed_time_reaches_the_uniforms() {
        let mut frames = frame_loop();
        let mut recorder = Recorder::default();
        frames.tick_at(0.5, &mut recorder).unwrap();
        frames.tick_at(1.25, &mut recorder).unwrap();
        let times: Vec<_> = recorder.frames.iter().map(|frame| frame.elapsed).collect();
        assert_eq!(times, [0.5, 1.25]);
    }

    #[test]
    fn resize_reaches_target_once() {
        let mut frames = frame_loop();
        let mut recorder = Recorder::default();
        assert!(frames.resize(Viewport::new(1600, 900, 1.0), &mut recorder));
        assert!(!frames.resize(Viewport::new(1600, 900, 1.0), &mut recorder));
        assert!(!frames.resize(Viewport::new(0, 0, 1.0), &mut recorder));
        assert_eq!(
            recorder.extents,
            [TargetExtent {
                width: 1600,
                height: 900
            }]
        );
        let frame = frames.tick_at(0.0, &mut recorder).unwrap();
        assert!((frame.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn draw_errors_are_returned() {
        let mut frames = frame_loop();
        let mut recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        assert_eq!(frames.tick_at(0.0, &mut recorder), Err("surface lost"));
    }
}
