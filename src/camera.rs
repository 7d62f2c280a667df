//! Scene and post-processing cameras.
//!
//! The scene camera is perspective and its far plane is tuned live. Fullscreen passes use
//! [`Camera::fullscreen`], an orthographic camera that maps the 2x2 quad onto the output.
//!
//! ```
//! use strata::{Camera, Vec3};
//!
//! let mut camera = Camera::default().at(0.0, 10.0, 20.0).looking_at(Vec3::ZERO);
//! camera.set_far(0.1);
//! assert!(camera.far > camera.near);
//! ```

use glam::{Mat4, Vec3};

/// How a camera maps view space to clip space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        aspect: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}

/// A camera for the scene or for fullscreen passes.
///
/// Right-handed, looking down `forward`. Depth maps `near..far` to `0..1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    /// Distance to the near clip plane.
    pub near: f32,
    /// Distance to the far clip plane; kept above `near` by [`set_far`](Self::set_far).
    pub far: f32,
    pub position: Vec3,
    /// View direction, normalized.
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective {
                fov_y: 45f32.to_radians(),
                aspect: 16.0 / 9.0,
            },
            near: 0.1,
            far: 50.0,
            position: Vec3::new(0.0, 10.0, 20.0),
            forward: Vec3::new(0.0, -10.0, -20.0).normalize(),
            up: Vec3::Y,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed post-processing camera: orthographic `(-1, 1, 1, -1, 0, 1)` at the
    /// origin, so a 2x2 quad exactly covers the output.
    pub fn fullscreen() -> Self {
        Self {
            projection: Projection::Orthographic {
                left: -1.0,
                right: 1.0,
                top: 1.0,
                bottom: -1.0,
            },
            near: 0.0,
            far: 1.0,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.forward = (target - self.position).normalize_or(Vec3::NEG_Z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        if let Projection::Perspective { fov_y, .. } = &mut self.projection {
            *fov_y = fov_degrees.to_radians();
        }
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.set_far(far);
        self
    }

    /// Smallest gap kept between the near and far planes.
    pub const MIN_DEPTH_RANGE: f32 = 1e-3;

    /// Moves the far plane, keeping it at least [`MIN_DEPTH_RANGE`](Self::MIN_DEPTH_RANGE)
    /// beyond `near` so the projection and depth linearization stay finite.
    pub fn set_far(&mut self, far: f32) {
        self.far = far.max(self.near + Self::MIN_DEPTH_RANGE);
    }

    /// Updates the aspect ratio of a perspective camera. Orthographic cameras ignore it.
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective { aspect: a, .. } = &mut self.projection {
            *a = aspect;
        }
    }

    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => Mat4::orthographic_rh(left, right, bottom, top, self.near, self.far),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
