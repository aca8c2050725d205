//! World Operations - Pure DOP Functions
//!
//! This is the PUBLIC API for driving the scene. One frame is
//! `update_world` followed by `render_world`.

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::world_data::{InstancePlacement, TouchEvent, TouchState, WorldData};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::geometry::{
    self, acquire_instance, create_geometry, release_instance, set_instance_hidden,
    set_instance_normal_matrix, set_instance_transform,
};
use crate::renderer::{self, CameraSource, RenderBackend, ShaderHandle};
use crate::shrapnel::{self, ShrapnelData};

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Build the scene from a validated config and mesh text.
///
/// Loads the geometry through `backend`, claims one instance slot per
/// placement and brings the shrapnel state to rest.
pub fn create_world<B: RenderBackend + ?Sized>(
    config: EngineConfig,
    backend: &mut B,
    shader: ShaderHandle,
    mesh_text: &str,
) -> EngineResult<WorldData> {
    config.validate()?;

    let rng = match config.shrapnel.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let instance_count = config.instance_count as usize;
    let mut geometry = create_geometry();
    let mut renderer = renderer::create_renderer(config.lighting.clone());
    renderer::load_from_text(
        &mut renderer,
        &mut geometry,
        backend,
        shader,
        mesh_text,
        &config.tangents,
        instance_count,
        config.max_subdivisions,
    )?;

    let scene = &config.scene;
    let placements = (0..instance_count)
        .map(|i| InstancePlacement {
            origin: scene.first_instance_origin + scene.instance_step * i as f32,
            rotation: Quat::IDENTITY,
            applied: None,
        })
        .collect();

    for _ in 0..instance_count {
        acquire_instance(&mut geometry);
    }

    let mut world = WorldData {
        shrapnel: ShrapnelData::new(&config.shrapnel),
        root_origin: scene.root_origin,
        placements,
        visible_instances: instance_count,
        rotation: 0.0,
        touches: Vec::new(),
        rng,
        frame: 0,
        geometry,
        renderer,
        config,
    };

    reset(&mut world);

    log::info!(
        "[create_world] {} instances, {} vertices each",
        instance_count,
        geometry::number_of_vertices(&world.geometry)
    );
    Ok(world)
}

/// Release instance slots and every buffer
pub fn destroy_world<B: RenderBackend + ?Sized>(world: &mut WorldData, backend: &mut B) {
    for instance in 0..world.placements.len() {
        release_instance(&mut world.geometry, instance);
    }
    world.touches.clear();
    renderer::unload(&mut world.renderer, &mut world.geometry, backend);

    log::info!("[destroy_world] World destroyed after {} frames", world.frame);
}

// ============================================================================
// INPUT
// ============================================================================

pub fn add_touch(world: &mut WorldData, state: TouchState, position: Vec2, taps: u32) {
    world.touches.push(TouchEvent {
        state,
        position,
        taps,
    });
}

/// Remove and return all pending touches
pub fn drain_touches(world: &mut WorldData) -> Vec<TouchEvent> {
    std::mem::take(&mut world.touches)
}

// ============================================================================
// FRAME
// ============================================================================

/// World transform of a placement under the scene root
pub fn placement_transform(root_origin: Vec3, placement: &InstancePlacement) -> Mat4 {
    Mat4::from_translation(root_origin)
        * Mat4::from_rotation_translation(placement.rotation, placement.origin)
}

/// Inverse-transpose of the upper 3x3 basis, zero when singular
pub fn normal_matrix(transform: &Mat4) -> Mat4 {
    let basis = Mat3::from_mat4(*transform);
    if basis.determinant() == 0.0 {
        return Mat4::from_mat3(Mat3::ZERO);
    }
    Mat4::from_mat3(basis.inverse().transpose())
}

/// Broadcast placements whose world transform changed since the last
/// broadcast. Untouched instances keep their per-vertex slots, so live
/// shrapnel is never overwritten by an unchanged placement.
fn apply_placements(world: &mut WorldData) {
    for (instance, placement) in world.placements.iter_mut().enumerate() {
        let transform = placement_transform(world.root_origin, placement);
        if placement.applied == Some(transform) {
            continue;
        }

        set_instance_transform(&mut world.geometry, instance, &transform);
        set_instance_normal_matrix(&mut world.geometry, instance, &normal_matrix(&transform));
        placement.applied = Some(transform);
    }
}

/// Advance one frame by `step`.
///
/// Order: drain input, spin the exploding instance while it is intact,
/// broadcast changed placements, then integrate shrapnel.
pub fn update_world(world: &mut WorldData, step: f32) {
    let touches = drain_touches(world);
    if !touches.is_empty() {
        log::trace!("[update_world] Drained {} touches", touches.len());
    }

    if !shrapnel::is_exploding(&world.shrapnel) {
        let spinning = world.shrapnel.instance;
        if let Some(placement) = world.placements.get_mut(spinning) {
            let rot_x = Quat::from_axis_angle(Vec3::X, world.rotation);
            let rot_y = Quat::from_axis_angle(Vec3::Y, world.rotation);
            placement.rotation = rot_x * rot_y;
        }
        world.rotation += step * world.config.scene.rotation_speed;
    }

    apply_placements(world);

    shrapnel::tick_shrapnel(&mut world.shrapnel, &mut world.geometry, step);

    world.frame += 1;
}

pub fn render_world<B, C>(world: &mut WorldData, backend: &mut B, camera: &C) -> EngineResult<()>
where
    B: RenderBackend + ?Sized,
    C: CameraSource + ?Sized,
{
    renderer::render(&mut world.renderer, &mut world.geometry, backend, camera)
}

// ============================================================================
// SCENE ACTIONS
// ============================================================================

/// Launch the shrapnel. Returns `false` if already exploding.
pub fn explode(world: &mut WorldData) -> bool {
    shrapnel::explode(&mut world.shrapnel, &mut world.rng)
}

/// Subdivide every instance one level and reset the fracture state.
/// Returns `false` when already at the maximum level; the reset happens
/// either way.
pub fn subdivide(world: &mut WorldData) -> bool {
    let subdivided = geometry::subdivide(&mut world.geometry);
    reset(world);
    subdivided
}

/// Return every triangle to rest and reapply placements and visibility
pub fn reset(world: &mut WorldData) {
    shrapnel::reset_shrapnel(&mut world.shrapnel, &mut world.geometry);

    // Reset wiped the exploding instance's vertex slots
    if let Some(placement) = world.placements.get_mut(world.shrapnel.instance) {
        placement.applied = None;
    }
    apply_placements(world);
    apply_visibility(world);
}

fn apply_visibility(world: &mut WorldData) {
    for instance in 0..world.placements.len() {
        let hidden = instance >= world.visible_instances;
        set_instance_hidden(&mut world.geometry, instance, hidden);
    }
}

/// Show the first `count` instances and hide the rest. Counts above the
/// allocated instance count are rejected.
pub fn set_visible_instance_count(world: &mut WorldData, count: usize) -> bool {
    if count > world.placements.len() {
        log::warn!(
            "[set_visible_instance_count] {} exceeds the {} allocated instances",
            count,
            world.placements.len()
        );
        return false;
    }
    world.visible_instances = count;
    apply_visibility(world);
    true
}

pub fn visible_instance_count(world: &WorldData) -> usize {
    world.visible_instances
}

pub fn is_exploding(world: &WorldData) -> bool {
    shrapnel::is_exploding(&world.shrapnel)
}

pub fn is_max_subdivisions(world: &WorldData) -> bool {
    geometry::is_max_subdivisions(&world.geometry)
}
