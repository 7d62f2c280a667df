//! Scene geometry on the GPU.
//!
//! - [`Vertex3d`]: position and normal, the vertex format of the scene shader
//! - [`InstanceRaw`]: per-instance model and normal matrices
//! - [`Mesh`]: vertex and index buffers uploaded once
//! - [`Transform`]: where one instance sits in the world
//!
//! ```
//! use strata::{Quat, Transform, Vec3};
//!
//! let transform = Transform::from_position(Vec3::new(0.0, 2.0, 0.0))
//!     .rotation(Quat::from_rotation_y(0.5))
//!     .uniform_scale(2.0);
//! let moved = transform.matrix().transform_point3(Vec3::ZERO);
//! assert_eq!(moved, Vec3::new(0.0, 2.0, 0.0));
//! ```

use glam::{Mat4, Quat, Vec3};
use wgpu::util::DeviceExt;

use crate::geometry::RawGeometry;

/// A vertex as the scene shader reads it.
///
/// Layout: position (loc 0), normal (loc 1), 24 bytes per vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Object-space position.
    pub position: [f32; 3],
    /// Should be normalized for correct lighting.
    pub normal: [f32; 3],
}

impl Vertex3d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Per-instance data: the model matrix (locations 2..=5) and its normal matrix
/// (locations 6..=8).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// First three columns of the inverse-transpose of `model`.
    pub normal: [[f32; 4]; 3],
}

impl InstanceRaw {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
        ],
    };

    pub fn from_transform(transform: &Transform) -> Self {
        let model = transform.matrix();
        let normal = model.inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                normal.x_axis.to_array(),
                normal.y_axis.to_array(),
                normal.z_axis.to_array(),
            ],
        }
    }
}

/// Geometry uploaded to the GPU. Immutable once created.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn from_geometry(device: &wgpu::Device, geometry: &RawGeometry) -> Self {
        Self::new(device, &geometry.vertices, &geometry.indices)
    }
}

/// Position, rotation and scale of one instance. Applied scale, then rotate, then
/// translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space translation.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 24);
        assert_eq!(Vertex3d::LAYOUT.array_stride, 24);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 112);
    }

    #[test]
    fn instance_normal_matrix_undoes_scale() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).uniform_scale(2.0);
        let raw = InstanceRaw::from_transform(&transform);
        assert_eq!(raw.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert!((raw.normal[0][0] - 0.5).abs() < 1e-6);
    }
}
