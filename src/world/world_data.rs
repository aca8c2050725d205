//! World Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in world_operations.rs

use glam::{Mat4, Quat, Vec2, Vec3};
use rand::rngs::StdRng;

use crate::config::EngineConfig;
use crate::geometry::GeometryData;
use crate::renderer::RendererData;
use crate::shrapnel::ShrapnelData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchState {
    Began,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub state: TouchState,
    pub position: Vec2,
    pub taps: u32,
}

/// Where one instance sits relative to the scene root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstancePlacement {
    pub origin: Vec3,
    pub rotation: Quat,
    /// Last world transform broadcast to the geometry, `None` forces a write
    pub applied: Option<Mat4>,
}

/// The whole scene: geometry, its renderer, the fracture state and the
/// per-instance placements. Created by `create_world` and torn down by
/// `destroy_world`.
#[derive(Debug)]
pub struct WorldData {
    pub config: EngineConfig,

    pub geometry: GeometryData,
    pub renderer: RendererData,
    pub shrapnel: ShrapnelData,

    pub root_origin: Vec3,
    pub placements: Vec<InstancePlacement>,
    /// Instances past this index are hidden
    pub visible_instances: usize,

    /// Accumulated rotation angle of the spinning instance, radians
    pub rotation: f32,

    /// Pending input, drained at the start of every update
    pub touches: Vec<TouchEvent>,

    pub rng: StdRng,
    pub frame: u64,
}
