//! Geometry Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in geometry_operations.rs,
//! transform_operations.rs and subdivision_operations.rs

use bitflags::bitflags;

use crate::constants::geometry::{FLOATS_PER_MATRIX, IDENTITY_MATRIX};
use crate::mesh::Vertex;

bitflags! {
    /// Which CPU buffers changed since the last upload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        const VERTICES = 1 << 0;
        const INDICES = 1 << 1;
        const MODEL_VIEW = 1 << 2;
        const NORMAL_MATRIX = 1 << 3;
    }
}

/// The four CPU buffers mirrored on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertices,
    Indices,
    ModelView,
    NormalMatrix,
}

impl BufferKind {
    pub const ALL: [BufferKind; 4] = [
        BufferKind::ModelView,
        BufferKind::NormalMatrix,
        BufferKind::Vertices,
        BufferKind::Indices,
    ];

    pub fn dirty_flag(self) -> DirtyFlags {
        match self {
            BufferKind::Vertices => DirtyFlags::VERTICES,
            BufferKind::Indices => DirtyFlags::INDICES,
            BufferKind::ModelView => DirtyFlags::MODEL_VIEW,
            BufferKind::NormalMatrix => DirtyFlags::NORMAL_MATRIX,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BufferKind::Vertices => "vertices",
            BufferKind::Indices => "indices",
            BufferKind::ModelView => "model_view",
            BufferKind::NormalMatrix => "normal_matrix",
        }
    }
}

/// Instanced mesh geometry with its CPU-side GPU mirrors.
///
/// Layout: instance `i` owns vertices
/// `[i * vertices_per_instance, (i + 1) * vertices_per_instance)` and the
/// matching stride in `indices`, whose values are offset by
/// `i * vertices_per_instance`. Transform buffers hold one column-major
/// matrix per (instance, vertex) slot, flattened.
///
/// Every buffer is sized at load time for the deepest subdivision level
/// so subdividing never reallocates.
#[derive(Debug, Clone)]
pub struct GeometryData {
    pub loaded: bool,

    /// Number of mesh copies, fixed at load
    pub instance_count: usize,
    pub max_subdivisions: u32,
    pub subdivision_level: u32,

    /// Per-instance topology counts, quadrupled by each subdivision
    pub vertices_per_instance: usize,
    pub indices_per_instance: usize,

    /// Vertices one instance may grow to at `max_subdivisions`
    pub max_vertices_per_instance: usize,

    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub model_view: Vec<f32>,
    pub normal_matrix: Vec<f32>,

    pub dirty: DirtyFlags,

    /// Instance slots handed out to scene nodes
    pub instance_slots: Vec<bool>,

    /// Staging matrix reused by per-vertex transform writes
    pub scratch_matrix: [f32; FLOATS_PER_MATRIX],
}

impl Default for GeometryData {
    fn default() -> Self {
        Self {
            loaded: false,
            instance_count: 0,
            max_subdivisions: 0,
            subdivision_level: 0,
            vertices_per_instance: 0,
            indices_per_instance: 0,
            max_vertices_per_instance: 0,
            vertices: Vec::new(),
            indices: Vec::new(),
            model_view: Vec::new(),
            normal_matrix: Vec::new(),
            dirty: DirtyFlags::all(),
            instance_slots: Vec::new(),
            scratch_matrix: IDENTITY_MATRIX,
        }
    }
}

/// Snapshot of buffer sizes for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryStats {
    pub instance_count: usize,
    pub subdivision_level: u32,
    pub vertices_per_instance: usize,
    pub indices_per_instance: usize,
    pub vertex_bytes: usize,
    pub index_bytes: usize,
    pub transform_bytes: usize,
    pub reserved_bytes: usize,
}

impl std::fmt::Display for GeometryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Geometry: {} instances @ level {}, {} vertices / {} indices per instance, {}B vertices, {}B indices, {}B transforms ({}B reserved)",
            self.instance_count,
            self.subdivision_level,
            self.vertices_per_instance,
            self.indices_per_instance,
            self.vertex_bytes,
            self.index_bytes,
            self.transform_bytes,
            self.reserved_bytes
        )
    }
}
