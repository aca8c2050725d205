/// Mesh Module - Data-Oriented Programming (DOP) style
///
/// - vertex_data.rs: the GPU vertex layout and parsed mesh container
/// - vertex_operations.rs: interpolation and tangent-basis functions
/// - obj_parser.rs: face-format text to unwelded mesh

pub mod obj_parser;
pub mod vertex_data;
pub mod vertex_operations;

// Re-export data structures
pub use vertex_data::{offsets, MeshData, Vertex, VERTEX_STRIDE};

// Re-export operations
pub use obj_parser::{parse_mesh, MeshParseError, MeshParseResult};
pub use vertex_operations::{
    average_normal, compute_tangent_basis, normalize_if_nonzero, orthogonalize_tangent_basis,
    vertex_average,
};
