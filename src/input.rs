use std::collections::HashSet;

use glam::Vec2;

/// Pointer button, independent of the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u16),
}

/// Pointer input forwarded from the window to the orbit controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed(PointerButton),
    Released(PointerButton),
    /// Cursor position in physical pixels.
    Moved(Vec2),
    /// Wheel notches; positive values scroll away from the user (zoom in).
    Scroll(f32),
}

/// Held buttons and last cursor position.
#[derive(Debug, Default, Clone)]
pub struct PointerState {
    buttons: HashSet<PointerButton>,
    position: Option<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: PointerButton) {
        self.buttons.insert(button);
    }

    pub fn release(&mut self, button: PointerButton) {
        self.buttons.remove(&button);
    }

    pub fn is_down(&self, button: PointerButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Records a new cursor position and returns the movement since the
    /// previous one (zero for the first sample).
    pub fn move_to(&mut self, position: Vec2) -> Vec2 {
        let delta = self
            .position
            .map(|previous| position - previous)
            .unwrap_or(Vec2::ZERO);
        self.position = Some(position);
        delta
    }
}
