//! # Native AI Selectors
//!
//! The host's own per-entity behavior. Every native tick runs the target
//! selector first; if it locked onto something the goal selector is skipped
//! for that tick.

use rand::{Rng, RngCore};

use crate::ecs::{EntityId, EntityKind, World};
use crate::math::Vec3;

/// Idle behaviors in the goal selector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Goal {
    /// With probability `chance` per tick, start walking in a random
    /// horizontal direction at `speed` blocks per tick.
    Wander {
        /// Per-tick trigger probability.
        chance: f64,
        /// Horizontal speed.
        speed: f64,
    },
    /// With probability `chance` per tick, turn to a random yaw.
    LookAround {
        /// Per-tick trigger probability.
        chance: f64,
    },
}

/// Behaviors in the target selector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetGoal {
    /// Walk toward the closest player within `range`.
    NearestPlayer {
        /// Search radius.
        range: f64,
        /// Approach speed.
        speed: f64,
    },
}

/// Goal selector contents for a freshly spawned entity.
#[must_use]
pub fn default_goals(kind: EntityKind) -> Vec<Goal> {
    match kind {
        EntityKind::Player => Vec::new(),
        EntityKind::Pig | EntityKind::Cow | EntityKind::Sheep => vec![
            Goal::Wander {
                chance: 0.05,
                speed: 0.1,
            },
            Goal::LookAround { chance: 0.02 },
        ],
        EntityKind::Villager | EntityKind::Zombie => vec![
            Goal::Wander {
                chance: 0.02,
                speed: 0.08,
            },
            Goal::LookAround { chance: 0.02 },
        ],
        EntityKind::ZombifiedPig => vec![Goal::Wander {
            chance: 0.02,
            speed: 0.12,
        }],
    }
}

/// Target selector contents for a freshly spawned entity.
#[must_use]
pub fn default_targets(kind: EntityKind) -> Vec<TargetGoal> {
    match kind {
        EntityKind::Zombie => vec![TargetGoal::NearestPlayer {
            range: 16.0,
            speed: 0.12,
        }],
        _ => Vec::new(),
    }
}

/// Runs both selectors of `id` once.
pub(crate) fn run_selectors(world: &mut World, rng: &mut dyn RngCore, id: EntityId) {
    let Some(from) = world.position(id) else {
        return;
    };

    let mut slot = 0;
    while let Some(target) = world.record(id).and_then(|r| r.targets().get(slot).copied()) {
        slot += 1;
        match target {
            TargetGoal::NearestPlayer { range, speed } => {
                let Some(player) = world.nearest(EntityKind::Player, from, range, id) else {
                    continue;
                };
                let Some(to) = world.position(player) else {
                    continue;
                };
                let dx = to.x - from.x;
                let dz = to.z - from.z;
                let dist = (dx * dx + dz * dz).sqrt();
                if dist > f64::EPSILON {
                    let keep_y = world.motion(id).map_or(0.0, |m| m.y);
                    world.set_motion(id, Vec3::new(dx / dist * speed, keep_y, dz / dist * speed));
                    let (yaw, pitch) = crate::native::look_angles(from, to);
                    world.set_rotation(id, yaw, pitch);
                }
                return;
            }
        }
    }

    let mut slot = 0;
    while let Some(goal) = world.record(id).and_then(|r| r.goals().get(slot).copied()) {
        slot += 1;
        match goal {
            Goal::Wander { chance, speed } => {
                if rng.gen_bool(chance.clamp(0.0, 1.0)) {
                    let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
                    let keep_y = world.motion(id).map_or(0.0, |m| m.y);
                    world.set_motion(id, Vec3::new(angle.sin() * speed, keep_y, angle.cos() * speed));
                }
            }
            Goal::LookAround { chance } => {
                if rng.gen_bool(chance.clamp(0.0, 1.0)) {
                    let yaw: f32 = rng.gen_range(0.0..360.0);
                    world.set_rotation(id, yaw, 0.0);
                }
            }
        }
    }
}
