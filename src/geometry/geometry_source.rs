//! Read access to instanced geometry.
//!
//! The renderer and the shrapnel simulator consume geometry through this
//! trait rather than the concrete buffers, so a different attribute store
//! can stand in for [`GeometryData`].

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::geometry_data::{BufferKind, GeometryData};
use super::geometry_operations;
use super::transform_operations;

pub trait GeometrySource {
    fn instance_count(&self) -> usize;
    fn number_of_vertices(&self) -> usize;
    fn number_of_indices(&self) -> usize;

    fn position(&self, instance: usize, vertex: usize) -> Option<Vec3>;
    fn color(&self, instance: usize, vertex: usize) -> Option<Vec4>;
    fn uv(&self, instance: usize, vertex: usize) -> Option<Vec2>;
    fn normal(&self, instance: usize, vertex: usize) -> Option<Vec3>;
    fn tangent(&self, instance: usize, vertex: usize) -> Option<Vec3>;
    fn bitangent(&self, instance: usize, vertex: usize) -> Option<Vec3>;

    fn vertex_transform(&self, instance: usize, vertex: usize) -> Mat4;

    /// Active bytes of one buffer
    fn buffer_bytes(&self, kind: BufferKind) -> &[u8];
    fn is_dirty(&self, kind: BufferKind) -> bool;
}

impl GeometrySource for GeometryData {
    fn instance_count(&self) -> usize {
        self.instance_count
    }

    fn number_of_vertices(&self) -> usize {
        geometry_operations::number_of_vertices(self)
    }

    fn number_of_indices(&self) -> usize {
        geometry_operations::number_of_indices(self)
    }

    fn position(&self, instance: usize, vertex: usize) -> Option<Vec3> {
        geometry_operations::vertex_at(self, instance, vertex).map(|v| Vec3::from_array(v.position))
    }

    fn color(&self, instance: usize, vertex: usize) -> Option<Vec4> {
        geometry_operations::vertex_at(self, instance, vertex).map(|v| Vec4::from_array(v.color))
    }

    fn uv(&self, instance: usize, vertex: usize) -> Option<Vec2> {
        geometry_operations::vertex_at(self, instance, vertex).map(|v| Vec2::from_array(v.uv))
    }

    fn normal(&self, instance: usize, vertex: usize) -> Option<Vec3> {
        geometry_operations::vertex_at(self, instance, vertex).map(|v| Vec3::from_array(v.normal))
    }

    fn tangent(&self, instance: usize, vertex: usize) -> Option<Vec3> {
        geometry_operations::vertex_at(self, instance, vertex).map(|v| Vec3::from_array(v.tangent))
    }

    fn bitangent(&self, instance: usize, vertex: usize) -> Option<Vec3> {
        geometry_operations::vertex_at(self, instance, vertex)
            .map(|v| Vec3::from_array(v.bitangent))
    }

    fn vertex_transform(&self, instance: usize, vertex: usize) -> Mat4 {
        transform_operations::get_vertex_transform(self, instance, vertex)
    }

    fn buffer_bytes(&self, kind: BufferKind) -> &[u8] {
        geometry_operations::buffer_bytes(self, kind)
    }

    fn is_dirty(&self, kind: BufferKind) -> bool {
        geometry_operations::is_dirty(self, kind)
    }
}
