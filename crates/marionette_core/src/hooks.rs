//! # Entity Hooks
//!
//! The callback table the host consults before running its own behavior.
//!
//! A [`Simulation`] keeps at most one [`EntityHooks`] object per live entity.
//! Whenever the host would tick, push, strike or collide that entity, it calls
//! the matching hook instead. Every hook defaults to the native behavior, so
//! an implementation only overrides what it wants to change. The free
//! functions in [`defaults`] are the native behavior itself, callable from an
//! override that wants to run it before or after its own logic.

use std::any::Any;

use crate::ecs::EntityId;
use crate::error::HookResult;
use crate::math::Vec3;
use crate::simulation::Simulation;

/// Per-entity overrides for host behavior.
///
/// # Example
///
/// ```rust,ignore
/// struct Anchored;
///
/// impl EntityHooks for Anchored {
///     fn on_external_push(&mut self, _: &mut Simulation, _: EntityId, _: Vec3) -> HookResult {
///         Ok(())
///     }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait EntityHooks: Any {
    /// Called once per simulation step.
    fn on_tick(&mut self, sim: &mut Simulation, id: EntityId) -> HookResult {
        defaults::tick(sim, id)
    }

    /// Called when lightning strikes the entity.
    fn on_lightning_strike(&mut self, sim: &mut Simulation, id: EntityId) -> HookResult {
        defaults::lightning_strike(sim, id)
    }

    /// Called when the entity's bounding box overlaps `other`'s.
    fn on_collide_with_entity(
        &mut self,
        sim: &mut Simulation,
        id: EntityId,
        other: EntityId,
    ) -> HookResult {
        defaults::collide(self, sim, id, other)
    }

    /// Called when anything external tries to add `push` to the entity's
    /// motion.
    fn on_external_push(&mut self, sim: &mut Simulation, id: EntityId, push: Vec3) -> HookResult {
        defaults::push(sim, id, push)
    }

    /// Id of the external controller driving this entity, if any.
    fn controller_id(&self) -> Option<u32> {
        None
    }

    /// Short label for log output.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Upcast for downcasting to the concrete hook type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete hook type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Native behavior, routed the way the host routes it.
pub mod defaults {
    use super::EntityHooks;
    use crate::ecs::EntityId;
    use crate::error::{HookError, HookResult};
    use crate::math::Vec3;
    use crate::native;
    use crate::simulation::Simulation;

    /// Native tick.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive.
    pub fn tick(sim: &mut Simulation, id: EntityId) -> HookResult {
        let (world, rng) = sim.world_and_rng();
        if native::tick(world, rng, id) {
            Ok(())
        } else {
            Err(HookError::DeadEntity(id))
        }
    }

    /// Native push: `push` is added to the motion unchanged.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive.
    pub fn push(sim: &mut Simulation, id: EntityId, push: Vec3) -> HookResult {
        if native::push(sim.world_mut(), id, push) {
            Ok(())
        } else {
            Err(HookError::DeadEntity(id))
        }
    }

    /// Native lightning strike.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive.
    pub fn lightning_strike(sim: &mut Simulation, id: EntityId) -> HookResult {
        if native::lightning_strike(sim.world_mut(), id) {
            Ok(())
        } else {
            Err(HookError::DeadEntity(id))
        }
    }

    /// Native collision: both entities are shoved apart.
    ///
    /// The colliding entity receives its half through its own
    /// [`EntityHooks::on_external_push`]; `other` receives its half through
    /// the hook table like any external push.
    ///
    /// # Errors
    ///
    /// Whatever either push hook returns.
    pub fn collide<H: EntityHooks + ?Sized>(
        hooks: &mut H,
        sim: &mut Simulation,
        id: EntityId,
        other: EntityId,
    ) -> HookResult {
        let Some(shove) = native::collision_shove(sim.world(), id, other) else {
            return Ok(());
        };
        hooks.on_external_push(sim, id, -shove)?;
        if sim.world().is_alive(other) {
            sim.push(other, shove)?;
        }
        Ok(())
    }
}
