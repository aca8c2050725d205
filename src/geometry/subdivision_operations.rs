//! Subdivision Operations - Pure DOP Functions
//!
//! Uniform midpoint subdivision: every triangle becomes four, with new
//! vertices synthesized by [`vertex_average`] at the edge midpoints.
//! Instance 0 is refined and the result replicated across all instances.

use super::geometry_data::{BufferKind, GeometryData};
use super::geometry_operations::{mark_dirty, replicate_instances};
use super::transform_operations::{
    reset_transforms, restore_instance_transforms, snapshot_instance_transforms,
};
use crate::constants::geometry::{SUBDIVISION_FACTOR, VERTICES_PER_TRIANGLE};
use crate::mesh::{vertex_average, Vertex};

/// Vertices emitted per refined triangle (4 children x 3 corners)
pub const CHILD_VERTICES: usize = SUBDIVISION_FACTOR * VERTICES_PER_TRIANGLE;

/// Split one triangle into four.
///
/// Children are emitted in this order, which fixes their winding:
/// `(p0, p0p1, p2p0)`, `(p0p1, p1, p1p2)`, `(p2p0, p1p2, p2)`,
/// `(p0p1, p1p2, p2p0)`.
pub fn subdivide_triangle(p0: &Vertex, p1: &Vertex, p2: &Vertex) -> [Vertex; CHILD_VERTICES] {
    let p0p1 = vertex_average(p0, p1);
    let p1p2 = vertex_average(p1, p2);
    let p2p0 = vertex_average(p2, p0);

    [
        *p0, p0p1, p2p0, //
        p0p1, *p1, p1p2, //
        p2p0, p1p2, *p2, //
        p0p1, p1p2, p2p0, //
    ]
}

/// Refine one instance worth of triangles. Returns unwelded vertices with
/// an identity index buffer.
pub fn subdivide_mesh(vertices: &[Vertex], indices: &[u32]) -> (Vec<Vertex>, Vec<u32>) {
    let triangles = indices.len() / VERTICES_PER_TRIANGLE;
    let mut refined = Vec::with_capacity(triangles * CHILD_VERTICES);

    for triangle in indices.chunks_exact(VERTICES_PER_TRIANGLE) {
        let corner = |i: usize| vertices.get(triangle[i] as usize);
        let (Some(p0), Some(p1), Some(p2)) = (corner(0), corner(1), corner(2)) else {
            log::warn!("[subdivide_mesh] Skipping triangle with out-of-range index {:?}", triangle);
            continue;
        };
        refined.extend_from_slice(&subdivide_triangle(p0, p1, p2));
    }

    let refined_indices = (0..refined.len() as u32).collect();
    (refined, refined_indices)
}

pub fn is_max_subdivisions(data: &GeometryData) -> bool {
    data.subdivision_level >= data.max_subdivisions
}

/// Apply one level of subdivision to every instance.
///
/// Whole-instance transforms survive the rebuild. Per-vertex displacement
/// does not: every slot is reset to identity before the instance
/// transforms are reapplied. Returns `false` when already at the limit.
pub fn subdivide(data: &mut GeometryData) -> bool {
    if !data.loaded {
        log::warn!("[subdivide] Geometry not loaded");
        return false;
    }
    if is_max_subdivisions(data) {
        log::warn!(
            "[subdivide] Already at maximum subdivision level {}",
            data.max_subdivisions
        );
        return false;
    }

    let snapshot = snapshot_instance_transforms(data);

    let base_vertices = &data.vertices[..data.vertices_per_instance];
    let base_indices = &data.indices[..data.indices_per_instance];
    let (vertices, indices) = subdivide_mesh(base_vertices, base_indices);

    if vertices.len() > data.max_vertices_per_instance {
        log::warn!(
            "[subdivide] Refined mesh of {} vertices exceeds reserved {} per instance",
            vertices.len(),
            data.max_vertices_per_instance
        );
        return false;
    }

    replicate_instances(data, &vertices, &indices);

    reset_transforms(data);
    restore_instance_transforms(data, &snapshot);

    for kind in BufferKind::ALL {
        mark_dirty(data, kind);
    }
    data.subdivision_level += 1;

    log::info!(
        "[subdivide] Level {} / {}: {} vertices, {} indices per instance",
        data.subdivision_level,
        data.max_subdivisions,
        data.vertices_per_instance,
        data.indices_per_instance
    );

    true
}
