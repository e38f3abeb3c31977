//! # Native Behaviors
//!
//! What the host does for an entity when nothing overrides it: the per-tick
//! physics step, knock-back, lightning and the collision shove.
//!
//! These functions only touch the [`World`]. Routing through the hook table
//! happens in [`crate::hooks::defaults`] and [`crate::Simulation`].

use rand::RngCore;

use crate::ai;
use crate::ecs::{EntityId, EntityKind, World};
use crate::math::Vec3;

/// Horizontal motion kept after each tick.
pub const DRAG_HORIZONTAL: f64 = 0.91;
/// Vertical motion kept after each tick.
pub const DRAG_VERTICAL: f64 = 0.98;
/// Health removed by a lightning strike.
pub const LIGHTNING_DAMAGE: f32 = 5.0;
/// Fire ticks set by a lightning strike.
pub const LIGHTNING_FIRE_TICKS: u32 = 160;
/// Burning entities lose one health point every this many ticks.
pub const FIRE_DAMAGE_INTERVAL: u32 = 20;
/// Width of every entity's bounding box.
pub const ENTITY_WIDTH: f64 = 0.6;
/// Height of every entity's bounding box.
pub const ENTITY_HEIGHT: f64 = 1.8;
/// Scale applied to the collision shove.
pub const COLLISION_STRENGTH: f64 = 0.05;

/// Runs one native tick for `id`: AI selectors, motion integration, drag and
/// fire.
///
/// Returns `false` if the entity is not alive.
pub fn tick(world: &mut World, rng: &mut dyn RngCore, id: EntityId) -> bool {
    if !world.is_alive(id) {
        return false;
    }

    ai::run_selectors(world, rng, id);

    if let (Some(position), Some(motion)) = (world.position(id), world.motion(id)) {
        world.set_position(id, position + motion);
        world.set_motion(
            id,
            Vec3::new(
                motion.x * DRAG_HORIZONTAL,
                motion.y * DRAG_VERTICAL,
                motion.z * DRAG_HORIZONTAL,
            ),
        );
    }

    if let Some(vitals) = world.vitals_mut(id) {
        if vitals.fire_ticks > 0 {
            if vitals.fire_ticks % FIRE_DAMAGE_INTERVAL == 0 {
                vitals.health = (vitals.health - 1.0).max(0.0);
            }
            vitals.fire_ticks -= 1;
        }
    }

    tracing::trace!(entity = %id, "native tick");
    true
}

/// Applies an external push to the entity's motion unchanged.
pub fn push(world: &mut World, id: EntityId, push: Vec3) -> bool {
    world.add_motion(id, push)
}

/// Native lightning strike.
///
/// Pigs turn into zombified pigs; everything else is damaged and set on fire.
pub fn lightning_strike(world: &mut World, id: EntityId) -> bool {
    let Some(kind) = world.record(id).map(|r| r.kind()) else {
        return false;
    };

    if kind == EntityKind::Pig {
        tracing::debug!(entity = %id, "lightning converted pig");
        world.convert(id, EntityKind::ZombifiedPig)
    } else {
        world.damage(id, LIGHTNING_DAMAGE) && world.ignite(id, LIGHTNING_FIRE_TICKS)
    }
}

/// Shove `other` receives when `id` collides with it.
///
/// `id` itself receives the negated vector. Returns `None` when either entity
/// is gone or they stand too close to pick a direction.
#[must_use]
pub fn collision_shove(world: &World, id: EntityId, other: EntityId) -> Option<Vec3> {
    let from = world.position(id)?;
    let to = world.position(other)?;

    let mut dx = to.x - from.x;
    let mut dz = to.z - from.z;
    let mut dist = dx.abs().max(dz.abs());
    if dist < 0.01 {
        return None;
    }

    dist = dist.sqrt();
    dx /= dist;
    dz /= dist;
    let falloff = (1.0 / dist).min(1.0);

    Some(Vec3::new(
        dx * falloff * COLLISION_STRENGTH,
        0.0,
        dz * falloff * COLLISION_STRENGTH,
    ))
}

/// Pairs of live entities whose bounding boxes overlap, `(a, b)` with `a`
/// before `b` in slot order.
#[must_use]
pub fn overlapping_pairs(world: &World) -> Vec<(EntityId, EntityId)> {
    let bodies: Vec<(EntityId, Vec3)> = world
        .alive_ids()
        .filter_map(|id| world.position(id).map(|p| (id, p)))
        .collect();

    let mut pairs = Vec::new();
    for (i, &(a, pa)) in bodies.iter().enumerate() {
        for &(b, pb) in &bodies[i + 1..] {
            if (pa.x - pb.x).abs() < ENTITY_WIDTH
                && (pa.z - pb.z).abs() < ENTITY_WIDTH
                && (pa.y - pb.y).abs() < ENTITY_HEIGHT
            {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Yaw and pitch (degrees) for looking from `from` toward `to`.
///
/// Yaw 0 faces +Z; positive pitch looks down.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn look_angles(from: Vec3, to: Vec3) -> (f32, f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dz = to.z - from.z;
    let horizontal = (dx * dx + dz * dz).sqrt();

    let yaw = dz.atan2(dx).to_degrees() - 90.0;
    let pitch = -dy.atan2(horizontal).to_degrees();
    (yaw as f32, pitch as f32)
}
