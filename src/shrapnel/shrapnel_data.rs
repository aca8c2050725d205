//! Shrapnel Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in shrapnel_operations.rs

use glam::{Mat4, Vec3};

use crate::config::ShrapnelConfig;

/// Per-triangle fracture state for one exploding instance.
///
/// Structure of arrays indexed by triangle; triangle `t` covers vertices
/// `3t..3t+3` of `instance`. Every array has `triangle_count` entries.
#[derive(Debug, Clone)]
pub struct ShrapnelData {
    /// Instance whose triangles are simulated
    pub instance: usize,
    pub triangle_count: usize,

    /// Accumulated displacement of each triangle
    pub displacements: Vec<Mat4>,
    pub velocities: Vec<Vec3>,
    /// Consumed and zeroed by the next tick
    pub impulses: Vec<Vec3>,
    /// Normalized mean of the triangle's vertex normals at reset
    pub rest_normals: Vec<Vec3>,

    pub exploding: bool,

    pub mass: f32,
    pub max_speed: f32,
    pub impulse_min: f32,
    pub impulse_max: f32,
}

impl ShrapnelData {
    pub fn new(config: &ShrapnelConfig) -> Self {
        Self {
            instance: config.exploding_instance as usize,
            triangle_count: 0,
            displacements: Vec::new(),
            velocities: Vec::new(),
            impulses: Vec::new(),
            rest_normals: Vec::new(),
            exploding: false,
            mass: config.mass,
            max_speed: config.max_speed,
            impulse_min: config.impulse_min,
            impulse_max: config.impulse_max,
        }
    }
}

impl Default for ShrapnelData {
    fn default() -> Self {
        Self::new(&ShrapnelConfig::default())
    }
}
