//! CPU reference for the depth linearization done in `depth_visualize.wgsl` and
//! `outline.wgsl`. Keep the two in sync.

/// How raw depth-buffer values are turned back into a linear `[0, 1]` distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearizationMethod {
    /// Inverts the perspective divide for a `[0, 1]` depth range.
    Perspective,
    /// Goes through `[-1, 1]` NDC first, the OpenGL way, then divides by `far`.
    Ndc,
}

impl LinearizationMethod {
    /// Numeric value the shaders switch on; matches the visualize mode index.
    pub fn index(self) -> u32 {
        match self {
            Self::Perspective => 2,
            Self::Ndc => 3,
        }
    }

    /// Anything that isn't the NDC mode falls back to the perspective inversion, as the
    /// shader does.
    pub fn from_index(index: u32) -> Self {
        if index == 3 { Self::Ndc } else { Self::Perspective }
    }

    /// Maps a depth-buffer sample `d` in `[0, 1]` to linear depth in `[0, 1]`.
    pub fn linearize(self, depth: f32, near: f32, far: f32) -> f32 {
        let linear = match self {
            Self::Perspective => {
                let view_z = perspective_depth_to_view_z(depth, near, far);
                view_z_to_orthographic_depth(view_z, near, far)
            }
            Self::Ndc => {
                let z_ndc = depth * 2.0 - 1.0;
                (2.0 * near * far) / (far + near - z_ndc * (far - near)) / far
            }
        };
        linear.clamp(0.0, 1.0)
    }
}

/// View-space z (negative in front of the camera) for a perspective depth sample.
pub fn perspective_depth_to_view_z(depth: f32, near: f32, far: f32) -> f32 {
    (near * far) / ((far - near) * depth - far)
}

/// Normalised distance of a view-space z between the clip planes.
pub fn view_z_to_orthographic_depth(view_z: f32, near: f32, far: f32) -> f32 {
    (-view_z - near) / (far - near)
}
