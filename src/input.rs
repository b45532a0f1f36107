//! Keyboard and mouse state for one frame.
//!
//! Key "down" and "up" are edges that last for the frame they happened in;
//! "held" lasts from the down edge to the up edge.

use std::collections::HashSet;

use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Debug, Default)]
pub struct Input {
    /// Set by a close request or Escape. The frame driver exits on it.
    pub quit: bool,
    down: HashSet<KeyCode>,
    held: HashSet<KeyCode>,
    up: HashSet<KeyCode>,
    mouse_delta: (f64, f64),
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.down.contains(&key)
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn is_key_up(&self, key: KeyCode) -> bool {
        self.up.contains(&key)
    }

    /// Mouse movement accumulated since the last frame.
    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    pub fn press(&mut self, key: KeyCode) {
        // Key repeat sends further presses while held; those are not edges.
        if self.held.insert(key) {
            self.down.insert(key);
        }
        if key == KeyCode::Escape {
            self.quit = true;
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        if self.held.remove(&key) {
            self.up.insert(key);
        }
    }

    pub fn add_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    /// Clears the per-frame edges and the mouse delta.
    pub fn end_frame(&mut self) {
        self.down.clear();
        self.up.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.quit = true,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.press(*key),
                ElementState::Released => self.release(*key),
            },
            // Released keys are never reported to an unfocused window.
            WindowEvent::Focused(false) => {
                self.up.extend(self.held.drain());
            }
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.add_mouse_motion(*dx, *dy);
        }
    }
}
