//! Live tunables and the keyboard panel that edits them.

use std::fmt;

use winit::keyboard::KeyCode;

use crate::input::Input;

/// What the depth demo puts on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum VisualizeMode {
    /// The lit scene, no post-processing.
    #[default]
    Scene,
    /// Every material replaced by `1 - depth`.
    DepthOverride,
    /// Depth buffer linearized with the perspective inversion.
    DepthLinearPerspective,
    /// Depth buffer linearized through NDC.
    DepthLinearNdc,
}

impl VisualizeMode {
    pub const ALL: [Self; 4] = [
        Self::Scene,
        Self::DepthOverride,
        Self::DepthLinearPerspective,
        Self::DepthLinearNdc,
    ];

    /// Numeric mode as passed to shaders.
    pub fn index(self) -> u32 {
        match self {
            Self::Scene => 0,
            Self::DepthOverride => 1,
            Self::DepthLinearPerspective => 2,
            Self::DepthLinearNdc => 3,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for VisualizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scene => "scene",
            Self::DepthOverride => "depth override",
            Self::DepthLinearPerspective => "linear depth (perspective)",
            Self::DepthLinearNdc => "linear depth (ndc)",
        };
        f.write_str(name)
    }
}

/// Values the user can tune while the demo runs.
///
/// Setters clamp; fields stay public for reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub visualize: VisualizeMode,
    pub camera_far: f32,
    pub blend: f32,
}

impl Settings {
    pub const FAR_RANGE: (f32, f32) = (0.1, 100.0);
    pub const FAR_STEP: f32 = 1.0;
    pub const BLEND_STEP: f32 = 0.05;

    pub fn with_visualize(mut self, mode: VisualizeMode) -> Self {
        self.visualize = mode;
        self
    }

    pub fn with_camera_far(mut self, far: f32) -> Self {
        self.set_camera_far(far);
        self
    }

    pub fn with_blend(mut self, blend: f32) -> Self {
        self.set_blend(blend);
        self
    }

    pub fn set_camera_far(&mut self, far: f32) {
        let (min, max) = Self::FAR_RANGE;
        self.camera_far = far.clamp(min, max);
    }

    pub fn set_blend(&mut self, blend: f32) {
        self.blend = blend.clamp(0.0, 1.0);
    }

    /// Applies this frame's key presses. Returns `true` if anything changed.
    ///
    /// | key        | effect                      |
    /// |------------|-----------------------------|
    /// | 1..4       | visualize mode 0..3         |
    /// | Up / Down  | far plane +/- 1             |
    /// | Right/Left | blend +/- 0.05              |
    pub fn handle_input(&mut self, input: &Input) -> bool {
        let before = *self;

        for (key, mode) in [
            (KeyCode::Digit1, VisualizeMode::Scene),
            (KeyCode::Digit2, VisualizeMode::DepthOverride),
            (KeyCode::Digit3, VisualizeMode::DepthLinearPerspective),
            (KeyCode::Digit4, VisualizeMode::DepthLinearNdc),
        ] {
            if input.key_pressed(key) {
                self.visualize = mode;
            }
        }

        if input.key_pressed(KeyCode::ArrowUp) {
            self.set_camera_far(self.camera_far + Self::FAR_STEP);
        }
        if input.key_pressed(KeyCode::ArrowDown) {
            self.set_camera_far(self.camera_far - Self::FAR_STEP);
        }
        if input.key_pressed(KeyCode::ArrowRight) {
            self.set_blend(self.blend + Self::BLEND_STEP);
        }
        if input.key_pressed(KeyCode::ArrowLeft) {
            self.set_blend(self.blend - Self::BLEND_STEP);
        }

        let changed = *self != before;
        if changed {
            log::info!(
                "settings: visualize={}, far={:.1}, blend={:.2}",
                self.visualize,
                self.camera_far,
                self.blend
            );
        }
        changed
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            visualize: VisualizeMode::Scene,
            camera_far: 50.0,
            blend: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp() {
        let mut settings = Settings::default();
        settings.set_camera_far(500.0);
        assert_eq!(settings.camera_far, 100.0);
        settings.set_camera_far(-3.0);
        assert_eq!(settings.camera_far, 0.1);
        settings.set_blend(1.5);
        assert_eq!(settings.blend, 1.0);
    }

    #[test]
    fn mode_indices_round_trip() {
        for mode in VisualizeMode::ALL {
            assert_eq!(VisualizeMode::from_index(mode.index()), Some(mode));
        }
        assert_eq!(VisualizeMode::from_index(4), None);
    }

    #[test]
    fn keys_drive_the_panel() {
        let mut input = Input::new();
        let mut settings = Settings::default();

        input.press(KeyCode::Digit3);
        input.press(KeyCode::ArrowUp);
        input.press(KeyCode::ArrowLeft);
        assert!(settings.handle_input(&input));
        assert_eq!(settings.visualize, VisualizeMode::DepthLinearPerspective);
        assert_eq!(settings.camera_far, 51.0);
        assert!((settings.blend - 0.45).abs() < 1e-6);

        input.begin_frame();
        assert!(!settings.handle_input(&input));
    }
}
