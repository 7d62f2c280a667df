use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

const ELEVATION_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// How the orbit controller moves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OrbitMode {
    /// Left-drag rotates, the wheel zooms.
    #[default]
    Interactive,
    /// Spins around the target at `speed` radians per second. Zoom still works.
    AutoRotate { speed: f32 },
}

/// Orbits the scene camera around a target point.
///
/// The controller only owns the orbit; projection and clip planes stay on the
/// [`Camera`] it drives.
///
/// # Example
/// ```ignore
/// let mut orbit = OrbitCamera::looking_from(Vec3::new(0.0, 10.0, 20.0), Vec3::ZERO);
///
/// // In the frame loop:
/// orbit.update(&input, time.dt);
/// orbit.apply(&mut camera);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Yaw in radians.
    pub azimuth: f32,
    /// Pitch in radians, kept off the poles.
    pub elevation: f32,
    pub mode: OrbitMode,
    pub sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            azimuth: 0.0,
            elevation: 0.3,
            mode: OrbitMode::Interactive,
            sensitivity: 0.005,
            zoom_sensitivity: 1.0,
            min_distance: 1.0,
            max_distance: 100.0,
        }
    }
}

impl OrbitCamera {
    /// Starts the orbit so the camera sits exactly at `position`.
    pub fn looking_from(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length();
        let (azimuth, elevation) = if distance > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance).clamp(-1.0, 1.0).asin(),
            )
        } else {
            (0.0, 0.0)
        };

        let mut orbit = Self {
            target,
            azimuth,
            elevation: elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT),
            ..Self::default()
        };
        orbit.distance = distance.clamp(orbit.min_distance, orbit.max_distance);
        orbit
    }

    pub fn mode(mut self, mode: OrbitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn update(&mut self, input: &Input, dt: f32) {
        match self.mode {
            OrbitMode::Interactive => {
                if input.mouse_down(MouseButton::Left) {
                    let delta = input.mouse_delta();
                    self.azimuth -= delta.x * self.sensitivity;
                    self.elevation = (self.elevation + delta.y * self.sensitivity)
                        .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
                }
            }
            OrbitMode::AutoRotate { speed } => self.azimuth += speed * dt,
        }

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            self.distance = (self.distance - scroll * self.zoom_sensitivity)
                .clamp(self.min_distance, self.max_distance);
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target + self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    /// Moves `camera` onto the orbit, facing the target.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position();
        camera.forward = (self.target - camera.position).normalize_or(Vec3::NEG_Z);
        camera.up = Vec3::Y;
    }
}
