// Input state tracking for keyboard and mouse
// Abstracts winit events into the discrete per-frame signals the viewer consumes

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Key that flips between smooth and flat shading (fires on release).
pub const TOGGLE_SHADING_KEY: KeyCode = KeyCode::KeyF;
/// Key that shows/hides the stats overlay (fires on release).
pub const TOGGLE_OVERLAY_KEY: KeyCode = KeyCode::F1;
/// Mouse button that must be held to orbit the camera.
pub const ORBIT_BUTTON: MouseButton = MouseButton::Left;

/// What the frame loop should do this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameSignals {
    /// Sum of the held direction keys, already scaled by the move step.
    pub translate: Vec3,
    pub toggle_shading: bool,
    pub toggle_overlay: bool,
    /// Cursor travel in pixels while the orbit button was held.
    pub orbit_drag: Vec2,
    pub exit: bool,
}

pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,
    // Keys released this frame after having been seen pressed; reset in end_frame()
    keys_released: HashSet<KeyCode>,

    // Mouse
    orbit_held: bool,
    cursor_position: Option<Vec2>,
    // Accumulated drag this frame, reset in end_frame()
    drag_delta: Vec2,

    close_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_released: HashSet::new(),
            orbit_held: false,
            cursor_position: None,
            drag_delta: Vec2::ZERO,
            close_requested: false,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the viewer's own event handling.
    ///
    /// `ui_consumed` is the overlay's verdict on the event. It only suppresses
    /// presses: releases always land here, or a button released over the
    /// overlay would leave the orbit (or a key) stuck down.
    pub fn process_event(&mut self, event: &WindowEvent, ui_consumed: bool) {
        if ui_consumed && is_press(event) {
            return;
        }
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } if *button == ORBIT_BUTTON => {
                self.set_orbit_held(*state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_position = None;
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            _ => {}
        }
    }

    fn press_key(&mut self, key: KeyCode) {
        self.keys_held.insert(key);
    }

    // Only a release that follows a press counts, so one physical key-press
    // produces exactly one toggle no matter how many frames it is held.
    fn release_key(&mut self, key: KeyCode) {
        if self.keys_held.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    fn set_orbit_held(&mut self, held: bool) {
        self.orbit_held = held;
    }

    fn move_cursor(&mut self, position: Vec2) {
        if self.orbit_held {
            if let Some(prev) = self.cursor_position {
                self.drag_delta += position - prev;
            }
        }
        self.cursor_position = Some(position);
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn was_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Collapse the current state into this frame's signals.
    /// W/S move along ±Z, A/D along ∓X, each by `move_step` per frame.
    pub fn signals(&self, move_step: f32) -> FrameSignals {
        let mut translate = Vec3::ZERO;
        if self.is_key_held(KeyCode::KeyW) { translate.z += move_step; }
        if self.is_key_held(KeyCode::KeyS) { translate.z -= move_step; }
        if self.is_key_held(KeyCode::KeyA) { translate.x -= move_step; }
        if self.is_key_held(KeyCode::KeyD) { translate.x += move_step; }

        FrameSignals {
            translate,
            toggle_shading: self.was_released(TOGGLE_SHADING_KEY),
            toggle_overlay: self.was_released(TOGGLE_OVERLAY_KEY),
            orbit_drag: self.drag_delta,
            exit: self.close_requested || self.is_key_held(KeyCode::Escape),
        }
    }

    /// Call once per frame after the signals have been consumed.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.keys_released.clear();
        self.drag_delta = Vec2::ZERO;
    }
}

fn is_press(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::KeyboardInput { event, .. } => event.state == ElementState::Pressed,
        WindowEvent::MouseInput { state, .. } => *state == ElementState::Pressed,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    fn mouse(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput { device_id: DeviceId::dummy(), state, button: ORBIT_BUTTON }
    }

    fn cursor(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved { device_id: DeviceId::dummy(), position: PhysicalPosition::new(x, y) }
    }

    #[test]
    fn release_over_overlay_ends_orbit() {
        let mut input = InputState::new();
        input.process_event(&cursor(10.0, 10.0), false);
        input.process_event(&mouse(ElementState::Pressed), false);
        input.process_event(&cursor(30.0, 10.0), false);
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::new(20.0, 0.0));
        input.end_frame();

        // Button comes up while the pointer is over the stats panel.
        input.process_event(&mouse(ElementState::Released), true);
        input.process_event(&cursor(80.0, 40.0), false);
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::ZERO);
    }

    #[test]
    fn press_over_overlay_does_not_orbit() {
        let mut input = InputState::new();
        input.process_event(&cursor(10.0, 10.0), false);
        input.process_event(&mouse(ElementState::Pressed), true);
        input.process_event(&cursor(50.0, 10.0), true);
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::ZERO);
    }

    #[test]
    fn toggle_fires_once_per_press_release() {
        let mut input = InputState::new();

        input.press_key(KeyCode::KeyF);
        assert!(!input.signals(0.05).toggle_shading);
        input.end_frame();

        // Held across frames: still nothing.
        assert!(!input.signals(0.05).toggle_shading);
        input.end_frame();

        input.release_key(KeyCode::KeyF);
        assert!(input.signals(0.05).toggle_shading);
        input.end_frame();

        assert!(!input.signals(0.05).toggle_shading);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut input = InputState::new();
        input.release_key(KeyCode::KeyF);
        assert!(!input.signals(0.05).toggle_shading);
    }

    #[test]
    fn direction_keys_sum() {
        let mut input = InputState::new();
        input.press_key(KeyCode::KeyW);
        input.press_key(KeyCode::KeyD);
        assert_eq!(input.signals(0.05).translate, Vec3::new(0.05, 0.0, 0.05));

        input.press_key(KeyCode::KeyS);
        input.press_key(KeyCode::KeyA);
        assert_eq!(input.signals(0.05).translate, Vec3::ZERO);
    }

    #[test]
    fn drag_only_counts_while_button_held() {
        let mut input = InputState::new();
        input.move_cursor(Vec2::new(10.0, 10.0));
        input.move_cursor(Vec2::new(20.0, 15.0));
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::ZERO);

        input.set_orbit_held(true);
        input.move_cursor(Vec2::new(25.0, 13.0));
        input.move_cursor(Vec2::new(27.0, 13.0));
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::new(7.0, -2.0));

        input.end_frame();
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::ZERO);

        input.set_orbit_held(false);
        input.move_cursor(Vec2::new(100.0, 100.0));
        assert_eq!(input.signals(0.05).orbit_drag, Vec2::ZERO);
    }

    #[test]
    fn escape_requests_exit() {
        let mut input = InputState::new();
        assert!(!input.signals(0.05).exit);
        input.press_key(KeyCode::Escape);
        assert!(input.signals(0.05).exit);
    }
}
