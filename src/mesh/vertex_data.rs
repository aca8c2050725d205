//! Vertex Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in vertex_operations.rs

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::{offset_of, size_of};

/// One fully assembled vertex, laid out exactly as the GPU reads it.
///
/// The color alpha doubles as the instance opacity/visibility channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            color: [1.0, 1.0, 1.0, 1.0],
            uv: [0.0; 2],
            normal: [0.0; 3],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        }
    }
}

/// Byte stride of one vertex in the vertex buffer
pub const VERTEX_STRIDE: usize = size_of::<Vertex>();

// 18 tightly packed floats, no padding (required by Pod as well)
const_assert_eq!(size_of::<Vertex>(), 72);

/// Byte offsets of each attribute inside [`Vertex`]
pub mod offsets {
    use super::*;

    pub const POSITION: usize = offset_of!(Vertex, position);
    pub const COLOR: usize = offset_of!(Vertex, color);
    pub const UV: usize = offset_of!(Vertex, uv);
    pub const NORMAL: usize = offset_of!(Vertex, normal);
    pub const TANGENT: usize = offset_of!(Vertex, tangent);
    pub const BITANGENT: usize = offset_of!(Vertex, bitangent);
}

/// A mesh as produced by the parser: one instance worth of unwelded
/// vertices plus a triangle-list index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / crate::constants::geometry::VERTICES_PER_TRIANGLE
    }
}
