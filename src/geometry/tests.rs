use glam::{Mat4, Vec3, Vec4};

use super::*;
use crate::error::EngineError;
use crate::mesh::{MeshData, Vertex};

fn corner(position: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position,
        uv,
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    }
}

fn single_triangle() -> MeshData {
    MeshData {
        vertices: vec![
            corner([0.0, 0.0, 0.0], [0.0, 0.0]),
            corner([2.0, 0.0, 0.0], [1.0, 0.0]),
            corner([0.0, 2.0, 0.0], [0.0, 1.0]),
        ],
        indices: vec![0, 1, 2],
    }
}

fn two_triangles() -> MeshData {
    let mut mesh = single_triangle();
    mesh.vertices.extend_from_slice(&[
        corner([2.0, 0.0, 0.0], [1.0, 0.0]),
        corner([2.0, 2.0, 0.0], [1.0, 1.0]),
        corner([0.0, 2.0, 0.0], [0.0, 1.0]),
    ]);
    mesh.indices.extend_from_slice(&[3, 4, 5]);
    mesh
}

fn loaded(mesh: &MeshData, instances: usize, max_subdivisions: u32) -> GeometryData {
    let mut data = create_geometry();
    load_geometry(&mut data, mesh, instances, max_subdivisions).unwrap();
    data
}

fn clear_all(data: &mut GeometryData) {
    for kind in BufferKind::ALL {
        clear_dirty(data, kind);
    }
}

#[test]
fn test_load_replicates_and_rebases_indices() {
    let data = loaded(&single_triangle(), 3, 2);

    assert_eq!(number_of_vertices(&data), 3);
    assert_eq!(number_of_indices(&data), 3);
    assert_eq!(data.indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(data.vertices[3], data.vertices[0]);
    assert_eq!(total_index_count(&data), 9);
    for kind in BufferKind::ALL {
        assert!(is_dirty(&data, kind));
    }
}

#[test]
fn test_load_reserves_for_max_subdivision() {
    let data = loaded(&single_triangle(), 2, 2);

    assert!(data.vertices.capacity() >= 2 * 3 * 16);
    assert_eq!(data.model_view.len(), 2 * 3 * 16 * 16);
    assert_eq!(data.max_vertices_per_instance, 48);
    assert_eq!(
        buffer_capacity_bytes(&data, BufferKind::Vertices),
        2 * 48 * std::mem::size_of::<Vertex>()
    );
    // Only the active region is exposed for upload
    assert_eq!(buffer_size(&data, BufferKind::ModelView), 2 * 3 * 16 * 4);
}

#[test]
fn test_double_load_is_rejected() {
    let mut data = loaded(&single_triangle(), 1, 1);
    let result = load_geometry(&mut data, &single_triangle(), 1, 1);
    assert!(matches!(result, Err(EngineError::StateError { .. })));

    unload_geometry(&mut data);
    assert!(!data.loaded);
    assert!(load_geometry(&mut data, &single_triangle(), 1, 1).is_ok());
}

#[test]
fn test_empty_mesh_is_rejected() {
    let mut data = create_geometry();
    let result = load_geometry(&mut data, &MeshData::default(), 1, 1);
    assert!(matches!(result, Err(EngineError::EmptyMesh)));
}

#[test]
fn test_oversized_subdivision_limit_is_rejected() {
    let mut data = create_geometry();
    for limit in [6, 40, u32::MAX] {
        let result = load_geometry(&mut data, &single_triangle(), 1, limit);
        assert!(
            matches!(result, Err(EngineError::InvalidConfig { .. })),
            "limit {} should be rejected",
            limit
        );
        assert!(!data.loaded);
    }
}

#[test]
fn test_capacity_multiplier_overflow_is_none() {
    assert_eq!(capacity_multiplier(2), Some(16));
    assert_eq!(capacity_multiplier(64), None);
}

#[test]
fn test_subdivision_quadruples_counts_for_any_instance_count() {
    for instances in 1..=4 {
        let mut data = loaded(&two_triangles(), instances, 2);
        let vertices = number_of_vertices(&data);
        let indices = number_of_indices(&data);

        assert!(subdivide(&mut data));

        assert_eq!(number_of_vertices(&data), vertices * 4);
        assert_eq!(number_of_indices(&data), indices * 4);
        assert_eq!(data.vertices.len(), instances * vertices * 4);
        assert_eq!(data.indices.len(), instances * indices * 4);
    }
}

#[test]
fn test_subdivision_stops_at_max_level() {
    let mut data = loaded(&single_triangle(), 2, 2);
    assert!(subdivide(&mut data));
    assert!(subdivide(&mut data));
    assert!(is_max_subdivisions(&data));

    let vertices = number_of_vertices(&data);
    let indices = number_of_indices(&data);
    assert!(!subdivide(&mut data));
    assert_eq!(number_of_vertices(&data), vertices);
    assert_eq!(number_of_indices(&data), indices);
    assert_eq!(data.subdivision_level, 2);
}

#[test]
fn test_subdivision_topology_and_fan_order() {
    let mut data = loaded(&single_triangle(), 1, 1);
    assert!(subdivide(&mut data));

    let positions: Vec<[f32; 3]> = (0..12)
        .map(|v| data.position(0, v).unwrap().to_array())
        .collect();

    let p0 = [0.0, 0.0, 0.0];
    let p1 = [2.0, 0.0, 0.0];
    let p2 = [0.0, 2.0, 0.0];
    let p0p1 = [1.0, 0.0, 0.0];
    let p1p2 = [1.0, 1.0, 0.0];
    let p2p0 = [0.0, 1.0, 0.0];

    assert_eq!(
        positions,
        vec![p0, p0p1, p2p0, p0p1, p1, p1p2, p2p0, p1p2, p2, p0p1, p1p2, p2p0]
    );
    assert_eq!(data.indices, (0..12).collect::<Vec<u32>>());
    assert_eq!(data.uv(0, 1).unwrap().to_array(), [0.5, 0.0]);
}

#[test]
fn test_subdivision_rebases_every_instance() {
    let mut data = loaded(&single_triangle(), 3, 1);
    assert!(subdivide(&mut data));

    for instance in 0..3 {
        let start = instance * 12;
        let block = &data.indices[start..start + 12];
        assert_eq!(block[0] as usize, instance * 12);
        assert_eq!(block[11] as usize, instance * 12 + 11);
    }
}

#[test]
fn test_subdivision_preserves_instance_transforms_and_drops_displacement() {
    let mut data = loaded(&single_triangle(), 2, 1);
    let placement = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let normal_matrix = Mat4::from_scale(Vec3::splat(2.0));
    set_instance_transform(&mut data, 1, &placement);
    set_instance_normal_matrix(&mut data, 1, &normal_matrix);
    set_vertex_transform(&mut data, 0, 1, &Mat4::from_translation(Vec3::X));

    assert!(subdivide(&mut data));

    for vertex in 0..number_of_vertices(&data) {
        assert_eq!(get_vertex_transform(&data, 1, vertex), placement);
        assert_eq!(get_vertex_transform(&data, 0, vertex), Mat4::IDENTITY);
    }
    assert_eq!(get_instance_normal_matrix(&data, 1), normal_matrix);
}

#[test]
fn test_transform_broadcast_invariant() {
    let mut data = loaded(&two_triangles(), 3, 1);
    let transform = Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::new(0.0, 1.1, 3.0));

    for instance in 0..3 {
        set_instance_transform(&mut data, instance, &transform);
        for vertex in 0..number_of_vertices(&data) {
            let read = get_vertex_transform(&data, instance, vertex);
            assert!(read.abs_diff_eq(transform, 1e-6));
        }
        assert!(get_instance_transform(&data, instance).abs_diff_eq(transform, 1e-6));
    }
}

#[test]
fn test_identical_set_does_not_redirty() {
    let mut data = loaded(&single_triangle(), 2, 1);
    let transform = Mat4::from_translation(Vec3::Y);

    clear_all(&mut data);
    set_instance_transform(&mut data, 0, &transform);
    assert!(is_dirty(&data, BufferKind::ModelView));

    clear_dirty(&mut data, BufferKind::ModelView);
    set_instance_transform(&mut data, 0, &transform);
    assert!(!is_dirty(&data, BufferKind::ModelView));

    // Identity is already stored everywhere after load
    set_instance_normal_matrix(&mut data, 1, &Mat4::IDENTITY);
    assert!(!is_dirty(&data, BufferKind::NormalMatrix));
}

#[test]
fn test_getters_leave_dirty_state_alone() {
    let mut data = loaded(&single_triangle(), 1, 1);
    clear_all(&mut data);

    let _ = get_instance_transform(&data, 0);
    let _ = get_vertex_transform(&data, 0, 2);
    let _ = data.color(0, 0);
    let _ = buffer_bytes(&data, BufferKind::Vertices);

    assert!(data.dirty.is_empty());
}

#[test]
fn test_vertex_transform_always_marks_dirty() {
    let mut data = loaded(&single_triangle(), 1, 1);
    clear_all(&mut data);

    set_vertex_transform(&mut data, 0, 0, &Mat4::IDENTITY);
    assert!(is_dirty(&data, BufferKind::ModelView));
}

#[test]
fn test_transform_vertex_accumulates() {
    let mut data = loaded(&single_triangle(), 1, 1);
    let step = Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0));

    transform_vertex(&mut data, 0, 2, &step);
    transform_vertex(&mut data, 0, 2, &step);

    let result = get_vertex_transform(&data, 0, 2);
    assert!(result.abs_diff_eq(Mat4::from_translation(Vec3::X), 1e-6));
    assert_eq!(get_vertex_transform(&data, 0, 1), Mat4::IDENTITY);
}

#[test]
fn test_out_of_range_access_is_safe() {
    let mut data = loaded(&single_triangle(), 2, 1);
    clear_all(&mut data);

    let transform = Mat4::from_translation(Vec3::Z);
    set_instance_transform(&mut data, 2, &transform);
    set_instance_normal_matrix(&mut data, 99, &transform);
    set_vertex_transform(&mut data, 0, 3, &transform);
    transform_vertex(&mut data, 5, 0, &transform);
    set_instance_opacity(&mut data, 7, 0.5, false);

    assert!(data.dirty.is_empty());
    assert_eq!(get_instance_transform(&data, 2), Mat4::IDENTITY);
    assert_eq!(get_vertex_transform(&data, 0, 3), Mat4::IDENTITY);
    assert_eq!(get_instance_normal_matrix(&data, 42), Mat4::IDENTITY);
    assert!(data.position(2, 0).is_none());
    assert!(vertex_at(&data, 0, 3).is_none());

    // Unloaded geometry behaves the same way
    let empty = create_geometry();
    assert_eq!(get_vertex_transform(&empty, 0, 0), Mat4::IDENTITY);
}

#[test]
fn test_opacity_and_hidden() {
    let mut data = loaded(&single_triangle(), 2, 1);
    clear_all(&mut data);

    set_instance_opacity(&mut data, 1, 2.5, false);
    assert!(!is_dirty(&data, BufferKind::Vertices), "alpha already 1.0");

    set_instance_opacity(&mut data, 1, 0.25, false);
    assert!(is_dirty(&data, BufferKind::Vertices));
    assert_eq!(data.color(1, 2).unwrap().w, 0.25);
    assert_eq!(data.color(0, 2).unwrap().w, 1.0);

    set_instance_opacity(&mut data, 1, 0.75, true);
    assert_eq!(data.color(1, 0).unwrap().w, 0.0);

    set_instance_hidden(&mut data, 1, false);
    assert_eq!(data.color(1, 0).unwrap().w, 1.0);
}

#[test]
fn test_color_base() {
    let mut data = loaded(&single_triangle(), 1, 1);
    clear_all(&mut data);

    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    set_instance_color_base(&mut data, 0, red, false);
    assert!(is_dirty(&data, BufferKind::Vertices));
    assert_eq!(data.color(0, 1).unwrap(), red);

    clear_dirty(&mut data, BufferKind::Vertices);
    set_instance_color_base(&mut data, 0, red, false);
    assert!(!is_dirty(&data, BufferKind::Vertices));

    set_instance_color_base(&mut data, 0, red, true);
    assert_eq!(data.color(0, 1).unwrap(), Vec4::new(1.0, 0.0, 0.0, 0.0));
}

#[test]
fn test_instance_slots() {
    let mut data = loaded(&single_triangle(), 2, 1);

    assert_eq!(acquire_instance(&mut data), Some(0));
    assert_eq!(acquire_instance(&mut data), Some(1));
    assert_eq!(acquire_instance(&mut data), None);

    release_instance(&mut data, 0);
    assert_eq!(data.color(0, 0).unwrap().w, 0.0);
    assert_eq!(acquire_instance(&mut data), Some(0));
}

#[test]
fn test_stats_report_active_sizes() {
    let data = loaded(&single_triangle(), 2, 1);
    let stats = geometry_stats(&data);

    assert_eq!(stats.instance_count, 2);
    assert_eq!(stats.vertex_bytes, 6 * std::mem::size_of::<Vertex>());
    assert_eq!(stats.index_bytes, 6 * 4);
    assert_eq!(stats.transform_bytes, 2 * 6 * 16 * 4);
    assert!(stats.reserved_bytes > stats.vertex_bytes + stats.index_bytes);
}
