//! Transform Operations - Pure DOP Functions
//!
//! Per-(instance, vertex) model-view and normal-matrix slots. Whole-instance
//! setters broadcast one matrix to every vertex slot of the instance and
//! skip slots that are already bit-identical, so re-sending an unchanged
//! transform never dirties the buffer.

use glam::Mat4;

use super::geometry_data::{BufferKind, GeometryData};
use super::geometry_operations::mark_dirty;
use crate::constants::geometry::{FLOATS_PER_MATRIX, IDENTITY_MATRIX};

/// Float offset of the matrix slot for (instance, vertex), `None` when out of range
fn slot_offset(data: &GeometryData, instance: usize, vertex: usize) -> Option<usize> {
    if instance >= data.instance_count || vertex >= data.vertices_per_instance {
        return None;
    }
    Some((instance * data.vertices_per_instance + vertex) * FLOATS_PER_MATRIX)
}

fn matrix_buffer(data: &GeometryData, kind: BufferKind) -> &[f32] {
    match kind {
        BufferKind::NormalMatrix => &data.normal_matrix,
        _ => &data.model_view,
    }
}

fn read_slot(data: &GeometryData, kind: BufferKind, offset: usize) -> Mat4 {
    matrix_buffer(data, kind)
        .get(offset..offset + FLOATS_PER_MATRIX)
        .map(Mat4::from_cols_slice)
        .unwrap_or(Mat4::IDENTITY)
}

/// Write `matrix` into every vertex slot of `instance`, returning whether
/// any slot changed. The scratch matrix stages the column-major floats.
fn broadcast(data: &mut GeometryData, kind: BufferKind, instance: usize, matrix: &Mat4) -> bool {
    if instance >= data.instance_count || data.vertices_per_instance == 0 {
        return false;
    }

    matrix.write_cols_to_slice(&mut data.scratch_matrix);
    let scratch = data.scratch_matrix;
    let source: &[u8] = bytemuck::cast_slice(&scratch);

    let start = instance * data.vertices_per_instance * FLOATS_PER_MATRIX;
    let end = start + data.vertices_per_instance * FLOATS_PER_MATRIX;
    let buffer = match kind {
        BufferKind::NormalMatrix => &mut data.normal_matrix,
        _ => &mut data.model_view,
    };
    let Some(region) = buffer.get_mut(start..end) else {
        return false;
    };

    let mut changed = false;
    for slot in region.chunks_exact_mut(FLOATS_PER_MATRIX) {
        if bytemuck::cast_slice::<f32, u8>(slot) != source {
            slot.copy_from_slice(&scratch);
            changed = true;
        }
    }
    changed
}

// ============================================================================
// WHOLE-INSTANCE TRANSFORMS
// ============================================================================

/// Broadcast a model-view transform to every vertex of an instance.
/// Out-of-range instances are ignored.
pub fn set_instance_transform(data: &mut GeometryData, instance: usize, transform: &Mat4) {
    if broadcast(data, BufferKind::ModelView, instance, transform) {
        mark_dirty(data, BufferKind::ModelView);
    }
}

/// Model-view transform of an instance, read from its first vertex slot
pub fn get_instance_transform(data: &GeometryData, instance: usize) -> Mat4 {
    match slot_offset(data, instance, 0) {
        Some(offset) => read_slot(data, BufferKind::ModelView, offset),
        None => Mat4::IDENTITY,
    }
}

pub fn set_instance_normal_matrix(data: &mut GeometryData, instance: usize, normal_matrix: &Mat4) {
    if broadcast(data, BufferKind::NormalMatrix, instance, normal_matrix) {
        mark_dirty(data, BufferKind::NormalMatrix);
    }
}

pub fn get_instance_normal_matrix(data: &GeometryData, instance: usize) -> Mat4 {
    match slot_offset(data, instance, 0) {
        Some(offset) => read_slot(data, BufferKind::NormalMatrix, offset),
        None => Mat4::IDENTITY,
    }
}

// ============================================================================
// PER-VERTEX TRANSFORMS
// ============================================================================

/// Overwrite one vertex slot of the model-view buffer. Always marks the
/// buffer dirty when the slot exists.
pub fn set_vertex_transform(data: &mut GeometryData, instance: usize, vertex: usize, transform: &Mat4) {
    let Some(offset) = slot_offset(data, instance, vertex) else {
        return;
    };

    transform.write_cols_to_slice(&mut data.scratch_matrix);
    let scratch = data.scratch_matrix;
    if let Some(slot) = data.model_view.get_mut(offset..offset + FLOATS_PER_MATRIX) {
        slot.copy_from_slice(&scratch);
        mark_dirty(data, BufferKind::ModelView);
    }
}

/// One vertex slot of the model-view buffer, identity when out of range
pub fn get_vertex_transform(data: &GeometryData, instance: usize, vertex: usize) -> Mat4 {
    match slot_offset(data, instance, vertex) {
        Some(offset) => read_slot(data, BufferKind::ModelView, offset),
        None => Mat4::IDENTITY,
    }
}

/// Accumulate `delta` onto a vertex slot: `current * delta`
pub fn transform_vertex(data: &mut GeometryData, instance: usize, vertex: usize, delta: &Mat4) {
    if slot_offset(data, instance, vertex).is_none() {
        return;
    }
    let current = get_vertex_transform(data, instance, vertex);
    set_vertex_transform(data, instance, vertex, &(current * *delta));
}

/// Refill both transform buffers with identity matrices across their full
/// reserved length.
pub fn reset_transforms(data: &mut GeometryData) {
    for slot in data.model_view.chunks_exact_mut(FLOATS_PER_MATRIX) {
        slot.copy_from_slice(&IDENTITY_MATRIX);
    }
    for slot in data.normal_matrix.chunks_exact_mut(FLOATS_PER_MATRIX) {
        slot.copy_from_slice(&IDENTITY_MATRIX);
    }
    mark_dirty(data, BufferKind::ModelView);
    mark_dirty(data, BufferKind::NormalMatrix);
}

/// Snapshot of every instance's whole-instance (model-view, normal) pair
pub fn snapshot_instance_transforms(data: &GeometryData) -> Vec<(Mat4, Mat4)> {
    (0..data.instance_count)
        .map(|instance| {
            (
                get_instance_transform(data, instance),
                get_instance_normal_matrix(data, instance),
            )
        })
        .collect()
}

pub fn restore_instance_transforms(data: &mut GeometryData, snapshot: &[(Mat4, Mat4)]) {
    for (instance, (transform, normal_matrix)) in snapshot.iter().enumerate() {
        set_instance_transform(data, instance, transform);
        set_instance_normal_matrix(data, instance, normal_matrix);
    }
}
