//! Vertex Operations - Pure DOP Functions
//!
//! Attribute interpolation and tangent-basis derivation over [`Vertex`]
//! slices. Triangle lists only: every 3 consecutive vertices form one
//! triangle.

use glam::{Vec2, Vec3, Vec4};

use super::vertex_data::Vertex;
use crate::constants::geometry::VERTICES_PER_TRIANGLE;

/// Normalize when the vector has any length, otherwise return it untouched.
pub fn normalize_if_nonzero(v: Vec3) -> Vec3 {
    if v.length_squared() > 0.0 {
        v.normalize()
    } else {
        v
    }
}

/// Edge midpoint of two vertices.
///
/// Every attribute is averaged component-wise. Alpha is forced back to
/// fully opaque and the basis vectors are re-normalized.
pub fn vertex_average(a: &Vertex, b: &Vertex) -> Vertex {
    let mid3 = |x: [f32; 3], y: [f32; 3]| (Vec3::from_array(x) + Vec3::from_array(y)) * 0.5;

    let mut color = (Vec4::from_array(a.color) + Vec4::from_array(b.color)) * 0.5;
    color.w = 1.0;

    Vertex {
        position: mid3(a.position, b.position).to_array(),
        color: color.to_array(),
        uv: ((Vec2::from_array(a.uv) + Vec2::from_array(b.uv)) * 0.5).to_array(),
        normal: normalize_if_nonzero(mid3(a.normal, b.normal)).to_array(),
        tangent: normalize_if_nonzero(mid3(a.tangent, b.tangent)).to_array(),
        bitangent: normalize_if_nonzero(mid3(a.bitangent, b.bitangent)).to_array(),
    }
}

/// Per-triangle tangent and bitangent from position and UV deltas.
///
/// All three vertices of a triangle receive the same pair. A degenerate
/// UV mapping (zero determinant) yields zero vectors instead of inf/NaN.
/// A trailing partial triangle is left untouched.
pub fn compute_tangent_basis(vertices: &mut [Vertex]) {
    for triangle in vertices.chunks_exact_mut(VERTICES_PER_TRIANGLE) {
        let v0 = Vec3::from_array(triangle[0].position);
        let v1 = Vec3::from_array(triangle[1].position);
        let v2 = Vec3::from_array(triangle[2].position);

        let uv0 = Vec2::from_array(triangle[0].uv);
        let uv1 = Vec2::from_array(triangle[1].uv);
        let uv2 = Vec2::from_array(triangle[2].uv);

        let delta_pos1 = v1 - v0;
        let delta_pos2 = v2 - v0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let d = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        let r = if d != 0.0 { 1.0 / d } else { 0.0 };

        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

        for vertex in triangle.iter_mut() {
            vertex.tangent = tangent.to_array();
            vertex.bitangent = bitangent.to_array();
        }
    }
}

/// Optional refinement pass after [`compute_tangent_basis`].
///
/// Gram-Schmidt orthogonalizes each tangent against its vertex normal,
/// then flips it when the basis is left-handed.
pub fn orthogonalize_tangent_basis(vertices: &mut [Vertex]) {
    for vertex in vertices.iter_mut() {
        let n = Vec3::from_array(vertex.normal);
        let b = Vec3::from_array(vertex.bitangent);
        let mut t = Vec3::from_array(vertex.tangent);

        t = normalize_if_nonzero(t - n * n.dot(t));

        if n.cross(t).dot(b) < 0.0 {
            t = -t;
        }

        vertex.tangent = t.to_array();
    }
}

/// Normalized mean of three vertex normals, zero when they cancel out.
pub fn average_normal(n0: Vec3, n1: Vec3, n2: Vec3) -> Vec3 {
    normalize_if_nonzero((n0 + n1 + n2) / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_at(position: [f32; 3], uv: [f32; 2]) -> Vertex {
        Vertex {
            position,
            uv,
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_average_is_midpoint_with_opaque_alpha() {
        let mut a = vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]);
        let mut b = vertex_at([2.0, 4.0, -2.0], [1.0, 1.0]);
        a.color = [1.0, 0.0, 0.0, 0.0];
        b.color = [0.0, 1.0, 0.0, 0.2];
        a.normal = [1.0, 0.0, 0.0];
        b.normal = [0.0, 1.0, 0.0];

        let mid = vertex_average(&a, &b);

        assert_eq!(mid.position, [1.0, 2.0, -1.0]);
        assert_eq!(mid.uv, [0.5, 0.5]);
        assert_eq!(mid.color, [0.5, 0.5, 0.0, 1.0]);
        let n = Vec3::from_array(mid.normal);
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.x - n.y).abs() < 1e-6);
    }

    #[test]
    fn test_average_keeps_zero_basis_vectors() {
        let a = Vertex::default();
        let b = Vertex::default();
        let mid = vertex_average(&a, &b);
        assert_eq!(mid.tangent, [0.0; 3]);
        assert_eq!(mid.bitangent, [0.0; 3]);
        assert!(mid.normal.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_tangent_basis_for_axis_aligned_uvs() {
        let mut vertices = vec![
            vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
            vertex_at([0.0, 1.0, 0.0], [0.0, 1.0]),
        ];

        compute_tangent_basis(&mut vertices);

        for vertex in &vertices {
            assert_eq!(vertex.tangent, [1.0, 0.0, 0.0]);
            assert_eq!(vertex.bitangent, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_tangent_basis_degenerate_uvs_collapse_to_zero() {
        let mut vertices = vec![
            vertex_at([0.0, 0.0, 0.0], [0.5, 0.5]),
            vertex_at([1.0, 0.0, 0.0], [0.5, 0.5]),
            vertex_at([0.0, 1.0, 0.0], [0.5, 0.5]),
        ];

        compute_tangent_basis(&mut vertices);

        for vertex in &vertices {
            assert_eq!(vertex.tangent, [0.0; 3]);
            assert_eq!(vertex.bitangent, [0.0; 3]);
        }
    }

    #[test]
    fn test_orthogonalize_flips_left_handed_tangent() {
        let mut vertices = vec![Vertex {
            normal: [0.0, 0.0, 1.0],
            tangent: [1.0, 0.0, 0.5],
            bitangent: [0.0, -1.0, 0.0],
            ..Default::default()
        }];

        orthogonalize_tangent_basis(&mut vertices);

        let t = Vec3::from_array(vertices[0].tangent);
        assert!((t - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_average_normal_degenerate_is_zero() {
        let n = average_normal(Vec3::X, -Vec3::X, Vec3::ZERO);
        assert_eq!(n, Vec3::ZERO);
    }
}
