//! Keyboard and mouse state for the frame loop.
//!
//! The host feeds every [`WindowEvent`] to [`Input::handle_event`], the frame reads the
//! accumulated state, and [`Input::begin_frame`] clears the per-frame parts (presses and
//! deltas) once the frame is done.
//!
//! ```
//! use strata::{Input, KeyCode};
//!
//! let mut input = Input::new();
//! input.press(KeyCode::Digit3);
//! assert!(input.key_pressed(KeyCode::Digit3));
//!
//! input.begin_frame();
//! assert!(!input.key_pressed(KeyCode::Digit3));
//! assert!(input.key_down(KeyCode::Digit3));
//! ```

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard and mouse state accumulated between frames.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once the frame has consumed its input.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press(key),
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.mouse_buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                if let Some(last) = self.mouse_position {
                    self.mouse_delta += pos - last;
                }
                self.mouse_position = Some(pos);
            }
            WindowEvent::CursorLeft { .. } => self.mouse_position = None,
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
            }
            WindowEvent::Focused(false) => {
                self.keys_down.clear();
                self.mouse_buttons_down.clear();
            }
            _ => {}
        }
    }

    /// Records a key press. Key repeat does not count as a new press.
    pub fn press(&mut self, key: KeyCode) {
        if self.keys_down.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Pressed since the last `begin_frame`.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll since the last `begin_frame`, in lines.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    #[cfg(test)]
    pub(crate) fn drag(&mut self, button: MouseButton, delta: Vec2) {
        self.mouse_buttons_down.insert(button);
        self.mouse_delta += delta;
    }

    #[cfg(test)]
    pub(crate) fn scroll(&mut self, lines: f32) {
        self.scroll_delta.y += lines;
    }
}
