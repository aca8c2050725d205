//! Shrapnel Operations - Pure DOP Functions
//!
//! Reset, explode and integrate the per-triangle fracture state. Every
//! triangle moves on its own; there is no collision and no rotation.

use glam::{Mat4, Vec3};
use rand::Rng;

use super::shrapnel_data::ShrapnelData;
use crate::constants::geometry::VERTICES_PER_TRIANGLE;
use crate::geometry::{set_vertex_transform, transform_vertex, GeometryData, GeometrySource};
use crate::mesh::average_normal;

/// Resynchronize with the current topology and return to rest.
///
/// Reallocates every per-triangle array for `vertices / 3` triangles,
/// recomputes rest normals, sets the simulated instance's vertex
/// transforms to identity and clears the exploding flag.
pub fn reset_shrapnel(data: &mut ShrapnelData, geometry: &mut GeometryData) {
    let triangle_count = geometry.number_of_vertices() / VERTICES_PER_TRIANGLE;
    let instance = data.instance;

    data.triangle_count = triangle_count;
    data.displacements = vec![Mat4::IDENTITY; triangle_count];
    data.velocities = vec![Vec3::ZERO; triangle_count];
    data.impulses = vec![Vec3::ZERO; triangle_count];
    data.rest_normals = Vec::with_capacity(triangle_count);

    for triangle in 0..triangle_count {
        let first = triangle * VERTICES_PER_TRIANGLE;
        let normal = |v: usize| geometry.normal(instance, first + v).unwrap_or(Vec3::ZERO);
        data.rest_normals
            .push(average_normal(normal(0), normal(1), normal(2)));

        for v in 0..VERTICES_PER_TRIANGLE {
            set_vertex_transform(geometry, instance, first + v, &Mat4::IDENTITY);
        }
    }

    data.exploding = false;

    log::info!(
        "[reset_shrapnel] {} triangles of instance {} at rest",
        triangle_count,
        instance
    );
}

/// Give every triangle a random impulse along its rest normal.
///
/// Each axis of the force is sampled independently from
/// `[impulse_min, impulse_max]` and multiplied component-wise with the
/// rest normal. Does nothing while already exploding or when the impulse
/// range is not a finite `min <= max` interval.
pub fn explode<R: Rng + ?Sized>(data: &mut ShrapnelData, rng: &mut R) -> bool {
    if data.exploding {
        log::debug!("[explode] Already exploding");
        return false;
    }

    let (min, max) = (data.impulse_min, data.impulse_max);
    if !(min.is_finite() && max.is_finite() && min <= max) {
        log::warn!("[explode] Impulse range [{}, {}] cannot be sampled", min, max);
        return false;
    }
    for (impulse, normal) in data.impulses.iter_mut().zip(&data.rest_normals) {
        let scale = Vec3::new(
            rng.gen_range(min..=max),
            rng.gen_range(min..=max),
            rng.gen_range(min..=max),
        );
        *impulse = *normal * scale;
    }
    data.exploding = true;

    log::info!("[explode] {} triangles launched", data.triangle_count);
    true
}

/// Queue the same impulse on every triangle and enter the exploding mode.
pub fn set_impulse(data: &mut ShrapnelData, impulse: Vec3) {
    data.impulses.fill(impulse);
    data.exploding = true;
}

/// Queue an impulse on a single triangle. Out-of-range triangles are ignored.
pub fn set_triangle_impulse(data: &mut ShrapnelData, triangle: usize, impulse: Vec3) {
    if let Some(slot) = data.impulses.get_mut(triangle) {
        *slot = impulse;
    }
}

/// Velocity after one tick.
///
/// The previous velocity is scaled by `dt` together with the new
/// acceleration (`(v + a) * dt`), not integrated as `v + a * dt`. Changing
/// this changes how far shrapnel travels.
pub fn integrate_velocity(velocity: Vec3, impulse: Vec3, mass: f32, max_speed: f32, dt: f32) -> Vec3 {
    let acceleration = impulse / mass;
    let velocity = (velocity + acceleration) * dt;

    if velocity.length() > max_speed {
        velocity.normalize() * max_speed
    } else {
        velocity
    }
}

/// Advance every triangle by `dt` and push its displacement onto its
/// three vertex transforms.
pub fn tick_shrapnel(data: &mut ShrapnelData, geometry: &mut GeometryData, dt: f32) {
    let instance = data.instance;

    for triangle in 0..data.triangle_count {
        let velocity = integrate_velocity(
            data.velocities[triangle],
            data.impulses[triangle],
            data.mass,
            data.max_speed,
            dt,
        );
        data.velocities[triangle] = velocity;

        let displacement = &mut data.displacements[triangle];
        displacement.w_axis += (velocity * dt).extend(0.0);

        let first = triangle * VERTICES_PER_TRIANGLE;
        for v in 0..VERTICES_PER_TRIANGLE {
            transform_vertex(geometry, instance, first + v, displacement);
        }

        data.impulses[triangle] = Vec3::ZERO;
    }

    log::trace!(
        "[tick_shrapnel] Integrated {} triangles, dt = {}",
        data.triangle_count,
        dt
    );
}

/// Translation part of a triangle's displacement
pub fn triangle_offset(data: &ShrapnelData, triangle: usize) -> Option<Vec3> {
    data.displacements
        .get(triangle)
        .map(|m| m.w_axis.truncate())
}

pub fn is_exploding(data: &ShrapnelData) -> bool {
    data.exploding
}
