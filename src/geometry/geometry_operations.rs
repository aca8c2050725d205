//! Geometry Operations - Pure DOP Functions
//!
//! Buffer lifecycle (load / unload), the byte views consumed by the render
//! boundary, dirty tracking and per-instance vertex color edits.

use glam::Vec4;

use super::geometry_data::{BufferKind, DirtyFlags, GeometryData, GeometryStats};
use crate::constants::geometry::{FLOATS_PER_MATRIX, IDENTITY_MATRIX, SUBDIVISION_FACTOR};
use crate::constants::limits;
use crate::error::{EngineError, EngineResult, OptionExt};
use crate::mesh::{MeshData, Vertex};

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Create empty, unloaded geometry
pub fn create_geometry() -> GeometryData {
    GeometryData::default()
}

/// Vertex headroom factor for a subdivision limit: `4^limit`, `None` on overflow
pub fn capacity_multiplier(max_subdivisions: u32) -> Option<usize> {
    SUBDIVISION_FACTOR.checked_pow(max_subdivisions)
}

fn capacity_overflow(instance_count: usize, max_subdivisions: u32) -> EngineError {
    EngineError::InvalidConfig {
        field: "max_subdivisions".to_string(),
        value: max_subdivisions.to_string(),
        reason: format!("buffer capacity for {} instances overflows", instance_count),
    }
}

/// Allocate all four buffers and replicate `mesh` across every instance.
///
/// Buffers are reserved for `instance_count * vertices * 4^max_subdivisions`
/// up front. Loading twice without [`unload_geometry`] is rejected, as is a
/// subdivision limit whose reservation cannot be sized or allocated.
pub fn load_geometry(
    data: &mut GeometryData,
    mesh: &MeshData,
    instance_count: usize,
    max_subdivisions: u32,
) -> EngineResult<()> {
    if data.loaded {
        return Err(EngineError::StateError {
            expected: "unloaded geometry".to_string(),
            actual: "geometry already loaded".to_string(),
        });
    }
    if mesh.triangle_count() == 0 || mesh.vertices.is_empty() {
        return Err(EngineError::EmptyMesh);
    }
    if instance_count == 0 {
        return Err(EngineError::InvalidConfig {
            field: "instance_count".to_string(),
            value: "0".to_string(),
            reason: "at least one instance is required".to_string(),
        });
    }
    if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= mesh.vertices.len()) {
        return Err(EngineError::BufferAccess {
            index: bad as usize,
            size: mesh.vertices.len(),
        });
    }

    if max_subdivisions > limits::MAX_SUBDIVISION_CEILING {
        return Err(EngineError::InvalidConfig {
            field: "max_subdivisions".to_string(),
            value: max_subdivisions.to_string(),
            reason: "exceeds the subdivision ceiling".to_string(),
        });
    }

    let overflow = || capacity_overflow(instance_count, max_subdivisions);
    let multiplier = capacity_multiplier(max_subdivisions).ok_or_engine(overflow)?;
    let max_vertices_per_instance = mesh
        .vertices
        .len()
        .checked_mul(multiplier)
        .ok_or_engine(overflow)?;
    let vertex_capacity = max_vertices_per_instance
        .checked_mul(instance_count)
        .ok_or_engine(overflow)?;
    let index_capacity = mesh
        .indices
        .len()
        .checked_mul(multiplier)
        .and_then(|n| n.checked_mul(instance_count))
        .ok_or_engine(overflow)?;
    let matrix_floats = vertex_capacity
        .checked_mul(FLOATS_PER_MATRIX)
        .ok_or_engine(overflow)?;

    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    vertices
        .try_reserve_exact(vertex_capacity)
        .map_err(|_| EngineError::BufferCreationFailed {
            size: vertex_capacity,
            usage: "vertices".to_string(),
        })?;
    indices
        .try_reserve_exact(index_capacity)
        .map_err(|_| EngineError::BufferCreationFailed {
            size: index_capacity,
            usage: "indices".to_string(),
        })?;

    data.instance_count = instance_count;
    data.max_subdivisions = max_subdivisions;
    data.subdivision_level = 0;
    data.vertices_per_instance = mesh.vertices.len();
    data.indices_per_instance = mesh.indices.len();
    data.max_vertices_per_instance = max_vertices_per_instance;

    data.vertices = vertices;
    data.indices = indices;
    replicate_instances(data, &mesh.vertices, &mesh.indices);

    data.model_view = identity_matrices(matrix_floats);
    data.normal_matrix = identity_matrices(matrix_floats);

    data.instance_slots = vec![false; instance_count];
    data.dirty = DirtyFlags::all();
    data.loaded = true;

    log::info!(
        "[load_geometry] Loaded {} instances x {} vertices ({} triangles), subdivision limit {}",
        instance_count,
        data.vertices_per_instance,
        mesh.triangle_count(),
        max_subdivisions
    );
    log::debug!("[load_geometry] {}", geometry_stats(data));

    Ok(())
}

/// Release every CPU buffer. GPU handles are released by the renderer.
pub fn unload_geometry(data: &mut GeometryData) {
    if !data.loaded {
        return;
    }

    *data = GeometryData {
        scratch_matrix: data.scratch_matrix,
        ..GeometryData::default()
    };

    log::info!("[unload_geometry] Geometry buffers released");
}

/// Overwrite the vertex and index buffers with `base` copied once per
/// instance. Index values are re-based per instance.
pub(crate) fn replicate_instances(data: &mut GeometryData, base_vertices: &[Vertex], base_indices: &[u32]) {
    let vertices_per_instance = base_vertices.len();

    data.vertices.clear();
    data.indices.clear();

    for instance in 0..data.instance_count {
        let offset = (instance * vertices_per_instance) as u32;
        data.vertices.extend_from_slice(base_vertices);
        data.indices
            .extend(base_indices.iter().map(|&index| offset + index));
    }

    data.vertices_per_instance = vertices_per_instance;
    data.indices_per_instance = base_indices.len();
    data.dirty |= DirtyFlags::VERTICES | DirtyFlags::INDICES;
}

fn identity_matrices(float_count: usize) -> Vec<f32> {
    let mut buffer = Vec::with_capacity(float_count);
    for _ in 0..float_count / FLOATS_PER_MATRIX {
        buffer.extend_from_slice(&IDENTITY_MATRIX);
    }
    buffer
}

// ============================================================================
// COUNTS AND BUFFER VIEWS
// ============================================================================

/// Vertices per instance at the current subdivision level
pub fn number_of_vertices(data: &GeometryData) -> usize {
    data.vertices_per_instance
}

/// Indices per instance at the current subdivision level
pub fn number_of_indices(data: &GeometryData) -> usize {
    data.indices_per_instance
}

/// Indices drawn by the single instanced draw call
pub fn total_index_count(data: &GeometryData) -> usize {
    data.instance_count * data.indices_per_instance
}

fn active_matrix_floats(data: &GeometryData) -> usize {
    data.instance_count * data.vertices_per_instance * FLOATS_PER_MATRIX
}

/// Bytes of the active region of a buffer, as uploaded every dirty frame
pub fn buffer_bytes(data: &GeometryData, kind: BufferKind) -> &[u8] {
    match kind {
        BufferKind::Vertices => bytemuck::cast_slice(&data.vertices),
        BufferKind::Indices => bytemuck::cast_slice(&data.indices),
        BufferKind::ModelView => {
            let end = active_matrix_floats(data).min(data.model_view.len());
            bytemuck::cast_slice(&data.model_view[..end])
        }
        BufferKind::NormalMatrix => {
            let end = active_matrix_floats(data).min(data.normal_matrix.len());
            bytemuck::cast_slice(&data.normal_matrix[..end])
        }
    }
}

/// Size in bytes of the active region
pub fn buffer_size(data: &GeometryData, kind: BufferKind) -> usize {
    buffer_bytes(data, kind).len()
}

/// Size in bytes the GPU buffer must reserve to fit the deepest level
pub fn buffer_capacity_bytes(data: &GeometryData, kind: BufferKind) -> usize {
    let remaining_levels = data.max_subdivisions.saturating_sub(data.subdivision_level);
    let max_vertices = data.instance_count.saturating_mul(data.max_vertices_per_instance);
    let max_indices = data
        .instance_count
        .saturating_mul(data.indices_per_instance)
        .saturating_mul(capacity_multiplier(remaining_levels).unwrap_or(usize::MAX));

    match kind {
        BufferKind::Vertices => max_vertices.saturating_mul(std::mem::size_of::<Vertex>()),
        BufferKind::Indices => max_indices.saturating_mul(std::mem::size_of::<u32>()),
        BufferKind::ModelView | BufferKind::NormalMatrix => max_vertices
            .saturating_mul(FLOATS_PER_MATRIX * std::mem::size_of::<f32>()),
    }
}

pub fn geometry_stats(data: &GeometryData) -> GeometryStats {
    GeometryStats {
        instance_count: data.instance_count,
        subdivision_level: data.subdivision_level,
        vertices_per_instance: data.vertices_per_instance,
        indices_per_instance: data.indices_per_instance,
        vertex_bytes: buffer_size(data, BufferKind::Vertices),
        index_bytes: buffer_size(data, BufferKind::Indices),
        transform_bytes: buffer_size(data, BufferKind::ModelView)
            + buffer_size(data, BufferKind::NormalMatrix),
        reserved_bytes: BufferKind::ALL
            .iter()
            .map(|&kind| buffer_capacity_bytes(data, kind))
            .sum(),
    }
}

// ============================================================================
// DIRTY TRACKING
// ============================================================================

pub fn is_dirty(data: &GeometryData, kind: BufferKind) -> bool {
    data.dirty.contains(kind.dirty_flag())
}

pub fn mark_dirty(data: &mut GeometryData, kind: BufferKind) {
    data.dirty.insert(kind.dirty_flag());
}

/// Only the upload path should call this
pub fn clear_dirty(data: &mut GeometryData, kind: BufferKind) {
    data.dirty.remove(kind.dirty_flag());
}

// ============================================================================
// VERTEX ACCESS
// ============================================================================

/// Vertex of an instance, `None` when either index is out of range
pub fn vertex_at(data: &GeometryData, instance: usize, vertex: usize) -> Option<&Vertex> {
    if instance >= data.instance_count || vertex >= data.vertices_per_instance {
        return None;
    }
    data.vertices.get(instance * data.vertices_per_instance + vertex)
}

fn instance_vertices_mut(data: &mut GeometryData, instance: usize) -> Option<&mut [Vertex]> {
    if !data.loaded || instance >= data.instance_count {
        return None;
    }
    let start = instance * data.vertices_per_instance;
    let end = start + data.vertices_per_instance;
    data.vertices.get_mut(start..end)
}

/// Apply `edit` to every vertex of an instance, marking the vertex buffer
/// dirty only if any byte changed.
fn edit_instance_colors<F>(data: &mut GeometryData, instance: usize, mut edit: F)
where
    F: FnMut(&mut [f32; 4]),
{
    let Some(vertices) = instance_vertices_mut(data, instance) else {
        return;
    };

    let mut changed = false;
    for vertex in vertices.iter_mut() {
        let before = vertex.color;
        edit(&mut vertex.color);
        if bytemuck::bytes_of(&before) != bytemuck::bytes_of(&vertex.color) {
            changed = true;
        }
    }

    if changed {
        mark_dirty(data, BufferKind::Vertices);
    }
}

/// Set every vertex alpha of an instance. Opacity is clamped to [0, 1];
/// a hidden instance gets alpha 0 regardless.
pub fn set_instance_opacity(data: &mut GeometryData, instance: usize, opacity: f32, hidden: bool) {
    let alpha = if hidden { 0.0 } else { opacity.clamp(0.0, 1.0) };
    edit_instance_colors(data, instance, |color| color[3] = alpha);
}

/// Show (alpha 1) or hide (alpha 0) an instance
pub fn set_instance_hidden(data: &mut GeometryData, instance: usize, hidden: bool) {
    let alpha = if hidden { 0.0 } else { 1.0 };
    edit_instance_colors(data, instance, |color| color[3] = alpha);
}

/// Replace the whole vertex color of an instance
pub fn set_instance_color_base(data: &mut GeometryData, instance: usize, color: Vec4, hidden: bool) {
    let mut rgba = color.to_array();
    if hidden {
        rgba[3] = 0.0;
    }
    edit_instance_colors(data, instance, |c| *c = rgba);
}

// ============================================================================
// INSTANCE SLOTS
// ============================================================================

/// Claim the first free instance slot
pub fn acquire_instance(data: &mut GeometryData) -> Option<usize> {
    let slot = data.instance_slots.iter().position(|used| !used)?;
    data.instance_slots[slot] = true;
    Some(slot)
}

/// Free an instance slot and hide its copy of the mesh
pub fn release_instance(data: &mut GeometryData, instance: usize) {
    if let Some(used) = data.instance_slots.get_mut(instance) {
        *used = false;
        set_instance_hidden(data, instance, true);
    }
}
