/// Shrapnel Module - Data-Oriented Programming (DOP) style
///
/// Per-triangle fracture of one instance: impulse, velocity and
/// displacement per triangle, written back as per-vertex transforms.
pub mod shrapnel_data;
pub mod shrapnel_operations;

pub use shrapnel_data::ShrapnelData;
pub use shrapnel_operations::{
    explode, integrate_velocity, is_exploding, reset_shrapnel, set_impulse, set_triangle_impulse,
    tick_shrapnel, triangle_offset,
};
