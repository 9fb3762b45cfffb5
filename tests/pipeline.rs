use blackhole_viewer::kernel;
use blackhole_viewer::{
    FrameLoop, FrameTarget, PointerEvent, TargetExtent, UniformFrame, ViewerConfig, Viewport,
};
use glam::Vec2;

#[derive(Default)]
struct Recorder {
    frames: Vec<UniformFrame>,
    extents: Vec<TargetExtent>,
}

impl FrameTarget for Recorder {
    type Error = std::convert::Infallible;

    fn resize(&mut self, extent: TargetExtent) {
        self.extents.push(extent);
    }

    fn draw(&mut self, frame: &UniformFrame) -> Result<(), Self::Error> {
        self.frames.push(*frame);
        Ok(())
    }
}

fn start(width: u32, height: u32) -> (FrameLoop, Recorder) {
    (
        FrameLoop::new(&ViewerConfig::default(), Viewport::new(width, height, 1.0)),
        Recorder::default(),
    )
}

#[test]
fn window_resize_updates_aspect_and_keeps_fov() {
    let (mut frames, mut target) = start(800, 600);
    let before = frames.tick_at(0.0, &mut target).unwrap();
    assert!((before.aspect - 4.0 / 3.0).abs() < 1e-4);
    assert_eq!(before.fov_degrees, 46.0);

    assert!(frames.resize(Viewport::new(1600, 900, 1.0), &mut target));
    let after = frames.tick_at(0.016, &mut target).unwrap();
    assert!((after.aspect - 16.0 / 9.0).abs() < 1e-4);
    assert_eq!(after.fov_degrees, 46.0);
    assert_eq!(
        target.extents,
        [TargetExtent {
            width: 1600,
            height: 900
        }]
    );
}

#[test]
fn repeated_resize_is_a_no_op() {
    let (mut frames, mut target) = start(800, 600);
    frames.resize(Viewport::new(1024, 768, 1.0), &mut target);
    let first = frames.tick_at(0.0, &mut target).unwrap();
    assert!(!frames.resize(Viewport::new(1024, 768, 1.0), &mut target));
    let second = frames.tick_at(0.0, &mut target).unwrap();
    assert_eq!(target.extents.len(), 1);
    assert_eq!(first.aspect, second.aspect);
}

#[test]
fn high_density_displays_are_capped() {
    let (mut frames, mut target) = start(800, 600);
    frames.resize(Viewport::new(3840, 2160, 3.0), &mut target);
    assert_eq!(
        frames.extent(),
        TargetExtent {
            width: 2560,
            height: 1440
        }
    );
}

#[test]
fn center_pixel_of_the_first_frame_is_black() {
    let (mut frames, mut target) = start(1280, 720);
    let frame = frames.tick_at(0.0, &mut target).unwrap();
    let sample = kernel::trace(
        kernel::primary_ray(&frame, Vec2::ZERO),
        &frame.params,
        frame.elapsed,
    );
    assert!(sample.captured);
    assert_eq!(sample.color, glam::Vec3::ZERO);
}

#[test]
fn scrolling_in_stops_at_min_distance() {
    let (mut frames, mut target) = start(1280, 720);
    for step in 0..600 {
        frames.handle_pointer(PointerEvent::Scroll(1.0));
        frames.tick_at(step as f32 / 60.0, &mut target).unwrap();
    }
    let distance = frames.rig().distance();
    assert!((distance - 5.8).abs() < 1e-3, "distance {distance}");
    for frame in &target.frames {
        assert!(frame.camera_position.length() >= 5.8 - 1e-3);
    }
}

#[test]
fn every_frame_basis_is_orthonormal() {
    let (mut frames, mut target) = start(1280, 720);
    frames.handle_pointer(PointerEvent::Moved(Vec2::new(640.0, 360.0)));
    frames.handle_pointer(PointerEvent::Pressed(blackhole_viewer::PointerButton::Primary));
    frames.handle_pointer(PointerEvent::Moved(Vec2::new(900.0, -2000.0)));
    frames.handle_pointer(PointerEvent::Released(blackhole_viewer::PointerButton::Primary));
    for step in 0..240 {
        let frame = frames.tick_at(step as f32 / 60.0, &mut target).unwrap();
        let basis = frame.basis;
        assert!((basis.right.length() - 1.0).abs() < 1e-3);
        assert!((basis.up.length() - 1.0).abs() < 1e-3);
        assert!((basis.forward.length() - 1.0).abs() < 1e-3);
        assert!(basis.right.dot(basis.up).abs() < 1e-3);
        assert!(basis.right.dot(basis.forward).abs() < 1e-3);
        assert!(basis.up.dot(basis.forward).abs() < 1e-3);
    }
}
