//! Pointer input port.
//!
//! Window events write into a [`PointerPort`]; the frame driver reads a
//! [`PointerState`] snapshot once per step. Both sides run on the event loop
//! thread, so a plain `Cell` is enough.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

/// Last known pointer position in normalized simulation space
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointerState {
    /// Position in [0,1]², origin bottom-left
    pub position: Vec2,

    /// Whether the pointer currently disturbs the surface
    pub active: bool,
}

impl PointerState {
    /// Active pointer at `position`
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            active: true,
        }
    }

    /// Map page pixels (origin top-left) into simulation space.
    ///
    /// Returns `None` for a degenerate viewport.
    pub fn from_page(x_px: f64, y_px: f64, width: u32, height: u32, active: bool) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let x = (x_px / width as f64) as f32;
        let y = 1.0 - (y_px / height as f64) as f32;
        Some(Self {
            position: clamp_unit(Vec2::new(x, y)),
            active,
        })
    }
}

/// Shared handle through which input events update the pointer
#[derive(Clone, Debug, Default)]
pub struct PointerPort {
    state: Rc<Cell<PointerState>>,
    /// Id of the finger currently steering the pointer
    touch: Rc<Cell<Option<u64>>>,
}

impl PointerPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pointer from normalized coordinates
    pub fn update_pointer(&self, x: f32, y: f32, active: bool) {
        self.state.set(PointerState {
            position: clamp_unit(Vec2::new(x, y)),
            active,
        });
    }

    /// Set the pointer from page pixel coordinates and the current viewport size
    pub fn update_from_page(&self, x_px: f64, y_px: f64, width: u32, height: u32, active: bool) {
        if let Some(state) = PointerState::from_page(x_px, y_px, width, height, active) {
            self.state.set(state);
        }
    }

    /// Touch start or move. The first finger down steers the pointer until
    /// it lifts; other fingers are ignored meanwhile.
    pub fn update_touch(&self, id: u64, x_px: f64, y_px: f64, width: u32, height: u32) {
        match self.touch.get() {
            Some(owner) if owner != id => {}
            _ => {
                self.touch.set(Some(id));
                self.update_from_page(x_px, y_px, width, height, true);
            }
        }
    }

    /// Touch end or cancel. Only the steering finger deactivates the pointer.
    pub fn end_touch(&self, id: u64) {
        if self.touch.get() == Some(id) {
            self.touch.set(None);
            self.deactivate();
        }
    }

    /// Stop disturbing the surface, keeping the last position
    pub fn deactivate(&self) {
        let mut state = self.state.get();
        state.active = false;
        self.state.set(state);
    }

    /// Latest pointer value
    pub fn snapshot(&self) -> PointerState {
        self.state.get()
    }
}

fn clamp_unit(p: Vec2) -> Vec2 {
    if p.is_finite() {
        p.clamp(Vec2::ZERO, Vec2::ONE)
    } else {
        Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_page_mapping_flips_y() {
        let state = PointerState::from_page(320.0, 90.0, 640, 360, true).unwrap();
        assert_relative_eq!(state.position.x, 0.5);
        assert_relative_eq!(state.position.y, 0.75);
        assert!(state.active);
    }

    #[test]
    fn test_page_mapping_clamps_and_rejects_empty_viewport() {
        let state = PointerState::from_page(-10.0, 1000.0, 100, 100, true).unwrap();
        assert_eq!(state.position, Vec2::new(0.0, 0.0));
        assert!(PointerState::from_page(5.0, 5.0, 0, 100, true).is_none());
    }

    #[test]
    fn test_port_is_shared_between_clones() {
        let port = PointerPort::new();
        let events = port.clone();
        assert!(!port.snapshot().active);

        events.update_pointer(0.25, 0.5, true);
        assert_eq!(port.snapshot(), PointerState::at(Vec2::new(0.25, 0.5)));

        events.deactivate();
        let state = port.snapshot();
        assert!(!state.active);
        assert_eq!(state.position, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn test_empty_viewport_keeps_previous_state() {
        let port = PointerPort::new();
        port.update_from_page(50.0, 50.0, 100, 100, true);
        port.update_from_page(10.0, 10.0, 0, 0, true);
        assert_eq!(port.snapshot().position, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_second_finger_does_not_lift_pointer() {
        let port = PointerPort::new();
        port.update_touch(1, 50.0, 50.0, 100, 100);
        port.update_touch(2, 10.0, 10.0, 100, 100);
        assert_eq!(port.snapshot(), PointerState::at(Vec2::new(0.5, 0.5)));

        port.end_touch(2);
        assert!(port.snapshot().active);

        port.update_touch(1, 75.0, 25.0, 100, 100);
        assert_eq!(port.snapshot(), PointerState::at(Vec2::new(0.75, 0.75)));

        port.end_touch(1);
        assert!(!port.snapshot().active);

        // Any finger may take over once the first one lifts
        port.update_touch(2, 0.0, 100.0, 100, 100);
        assert_eq!(port.snapshot(), PointerState::at(Vec2::new(0.0, 0.0)));
    }
}
