/// World Module - Data-Oriented Programming (DOP) style
///
/// The scene context: owns the geometry, its renderer, the shrapnel state
/// and the per-instance placements. There is no global world; callers
/// create one with `create_world` and pass it to every operation.
pub mod world_data;
pub mod world_operations;

pub use world_data::{InstancePlacement, TouchEvent, TouchState, WorldData};
pub use world_operations::{
    add_touch, create_world, destroy_world, drain_touches, explode, is_exploding,
    is_max_subdivisions, normal_matrix, placement_transform, render_world, reset,
    set_visible_instance_count, subdivide, update_world, visible_instance_count,
};
