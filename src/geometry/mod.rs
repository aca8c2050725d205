/// Geometry Module - Data-Oriented Programming (DOP) style
///
/// Instanced mesh buffers, their per-vertex transform mirrors and the
/// subdivision engine. Data lives in geometry_data.rs; every mutation is
/// a free function in one of the *_operations.rs files.
pub mod geometry_data;
pub mod geometry_operations;
pub mod geometry_source;
pub mod subdivision_operations;
pub mod transform_operations;

#[cfg(test)]
mod tests;

// Re-export data structures
pub use geometry_data::{BufferKind, DirtyFlags, GeometryData, GeometryStats};
pub use geometry_source::GeometrySource;

// Re-export operations
pub use geometry_operations::{
    acquire_instance, buffer_bytes, buffer_capacity_bytes, buffer_size, capacity_multiplier,
    clear_dirty, create_geometry, geometry_stats, is_dirty, load_geometry, mark_dirty,
    number_of_indices, number_of_vertices, release_instance, set_instance_color_base,
    set_instance_hidden, set_instance_opacity, total_index_count, unload_geometry, vertex_at,
};
pub use subdivision_operations::{is_max_subdivisions, subdivide, subdivide_mesh, subdivide_triangle};
pub use transform_operations::{
    get_instance_normal_matrix, get_instance_transform, get_vertex_transform, reset_transforms,
    set_instance_normal_matrix, set_instance_transform, set_vertex_transform, transform_vertex,
};
