//! # Entity Overrides
//!
//! The hook object installed for an NPC-controlled entity.
//!
//! An override is either **unbound** (no NPC; every hook behaves exactly like
//! the native entity) or **bound** (an NPC drives the entity). Binding clears
//! and locks the entity's AI selectors; there is no way back to unbound.
//!
//! | Hook | Unbound | Bound |
//! |------|---------|-------|
//! | tick | native | native, then `npc.update()` |
//! | lightning | native | suppressed |
//! | collide | native | native, then a [`CollisionEvent`] if anyone listens |
//! | push | native | protection flag and [`PushEvent`] decide |

use std::any::Any;
use std::rc::Rc;

use marionette_core::hooks::defaults;
use marionette_core::{EntityHooks, EntityId, EntityKind, HookError, HookResult, Simulation, Vec3, World};

use super::facade::{FacadeKind, MobFacade, PigFacade, PlayerFacade};
use crate::events::{CollisionEvent, EntityRef, EventPipeline, PushEvent};
use crate::metadata::keys;
use crate::npc::{NpcHandle, NpcId};

/// Hook object for one host entity, generic over the facade it hands out.
pub struct EntityOverride<F: FacadeKind> {
    entity: EntityId,
    kind: EntityKind,
    npc: Option<NpcHandle>,
    pipeline: Rc<EventPipeline>,
    facade: Option<Rc<F>>,
}

/// Override for player-type entities.
pub type HumanOverride = EntityOverride<PlayerFacade>;
/// Override for pigs.
pub type PigOverride = EntityOverride<PigFacade>;
/// Override for every other mob.
pub type MobOverride = EntityOverride<MobFacade>;

impl<F: FacadeKind> EntityOverride<F> {
    /// Creates an unbound override. The entity keeps its AI.
    #[must_use]
    pub fn unbound(entity: EntityId, kind: EntityKind, pipeline: Rc<EventPipeline>) -> Self {
        Self {
            entity,
            kind,
            npc: None,
            pipeline,
            facade: None,
        }
    }

    /// Creates an override bound to `npc`, clearing and locking the entity's
    /// AI selectors.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if the entity is not alive.
    pub fn bound(
        world: &mut World,
        entity: EntityId,
        npc: NpcHandle,
        pipeline: Rc<EventPipeline>,
    ) -> Result<Self, HookError> {
        let kind = world
            .record(entity)
            .map(marionette_core::EntityRecord::kind)
            .ok_or(HookError::DeadEntity(entity))?;
        world.lock_selectors(entity);

        Ok(Self {
            entity,
            kind,
            npc: Some(npc),
            pipeline,
            facade: None,
        })
    }

    /// The host entity.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Whether an NPC drives the entity.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.npc.is_some()
    }

    /// The NPC, if bound.
    #[must_use]
    pub fn npc(&self) -> Option<&NpcHandle> {
        self.npc.as_ref()
    }

    /// The facade, created on first access and cached afterwards.
    pub fn facade(&mut self) -> Rc<F> {
        let (entity, kind, npc) = (self.entity, self.kind, &self.npc);
        Rc::clone(
            self.facade
                .get_or_insert_with(|| Rc::new(F::create(entity, kind, npc.clone()))),
        )
    }

    /// Whether the facade has been created yet.
    #[must_use]
    pub const fn has_facade(&self) -> bool {
        self.facade.is_some()
    }

    fn protected(npc: &NpcHandle, entity: EntityId) -> Result<bool, HookError> {
        let npc = npc.try_borrow().map_err(|_| HookError::NpcBusy(entity))?;
        Ok(npc.data().get(keys::DEFAULT_PROTECTED, true))
    }
}

impl<F: FacadeKind> EntityHooks for EntityOverride<F> {
    fn on_tick(&mut self, sim: &mut Simulation, id: EntityId) -> HookResult {
        defaults::tick(sim, id)?;
        if let Some(npc) = &self.npc {
            let mut npc = npc.try_borrow_mut().map_err(|_| HookError::NpcBusy(id))?;
            npc.update(sim, id)?;
        }
        Ok(())
    }

    fn on_lightning_strike(&mut self, sim: &mut Simulation, id: EntityId) -> HookResult {
        if self.is_bound() {
            tracing::debug!(entity = %id, "lightning suppressed for npc");
            return Ok(());
        }
        defaults::lightning_strike(sim, id)
    }

    fn on_collide_with_entity(
        &mut self,
        sim: &mut Simulation,
        id: EntityId,
        other: EntityId,
    ) -> HookResult {
        // Both participants run this, so the event cannot prevent movement.
        defaults::collide(self, sim, id, other)?;

        let Some(npc) = &self.npc else {
            return Ok(());
        };
        if self.pipeline.listener_count::<CollisionEvent>() == 0 {
            return Ok(());
        }
        let Some(kind) = sim.world().record(other).map(marionette_core::EntityRecord::kind) else {
            return Ok(());
        };

        let other = EntityRef {
            id: other,
            kind,
            npc: sim.hooks(other).and_then(|hooks| hooks.controller_id()).map(NpcId),
        };
        let mut event = CollisionEvent::new(Rc::clone(npc), id, other);
        self.pipeline
            .dispatch(&mut event)
            .map_err(|err| err.into_hook_error(id))
    }

    fn on_external_push(&mut self, sim: &mut Simulation, id: EntityId, push: Vec3) -> HookResult {
        let Some(npc) = &self.npc else {
            return defaults::push(sim, id, push);
        };
        let protected = Self::protected(npc, id)?;

        if self.pipeline.listener_count::<PushEvent>() == 0 {
            if protected {
                tracing::trace!(entity = %id, "push dropped for protected npc");
                return Ok(());
            }
            return defaults::push(sim, id, push);
        }

        let mut event = PushEvent::new(Rc::clone(npc), id, push, protected);
        self.pipeline
            .dispatch(&mut event)
            .map_err(|err| err.into_hook_error(id))?;

        if event.is_cancelled() {
            tracing::debug!(entity = %id, "push cancelled by listeners");
            Ok(())
        } else {
            defaults::push(sim, id, event.vector())
        }
    }

    fn controller_id(&self) -> Option<u32> {
        let npc = self.npc.as_ref()?.try_borrow().ok()?;
        Some(npc.id().0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::events::ListenerError;
    use crate::npc::BasicNpc;
    use marionette_core::{Location, RandomSource};

    fn setup(kind: EntityKind) -> (Simulation, EntityId, Rc<EventPipeline>) {
        let mut sim = Simulation::new(8, &RandomSource::ChaCha { seed: 11 });
        let id = sim.spawn(kind, Location::new(0.0, 64.0, 0.0)).unwrap();
        (sim, id, Rc::new(EventPipeline::new()))
    }

    fn bind(
        sim: &mut Simulation,
        id: EntityId,
        pipeline: &Rc<EventPipeline>,
        npc: BasicNpc,
    ) -> Rc<RefCell<BasicNpc>> {
        let npc = npc.into_shared();
        let hooks = PigOverride::bound(sim.world_mut(), id, npc.clone(), Rc::clone(pipeline)).unwrap();
        sim.install_hooks(id, Box::new(hooks));
        npc
    }

    #[test]
    fn test_bind_locks_selectors() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        bind(&mut sim, id, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));

        let record = sim.world().record(id).unwrap();
        assert!(record.goals().is_empty());
        assert!(record.targets().is_empty());
        assert!(record.selectors_locked());
    }

    #[test]
    fn test_bind_dead_entity_fails() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        sim.despawn(id);
        let npc: NpcHandle = BasicNpc::new(NpcId(1), "Ghost").into_shared();
        assert!(matches!(
            PigOverride::bound(sim.world_mut(), id, npc, pipeline),
            Err(HookError::DeadEntity(_))
        ));
    }

    #[test]
    fn test_tick_updates_npc_after_physics() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        let npc = bind(&mut sim, id, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));
        sim.world_mut().set_motion(id, Vec3::new(2.0, 0.0, 0.0));

        sim.step().unwrap();

        let npc = npc.borrow();
        assert_eq!(npc.updates(), 1);
        assert_eq!(npc.last_seen().map(|l| l.x), Some(2.0));
    }

    #[test]
    fn test_lightning_suppressed_when_bound() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        bind(&mut sim, id, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));

        sim.strike_lightning(id).unwrap();
        assert_eq!(sim.world().record(id).unwrap().kind(), EntityKind::Pig);
    }

    #[test]
    fn test_lightning_native_when_unbound() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        sim.install_hooks(id, Box::new(PigOverride::unbound(id, EntityKind::Pig, pipeline)));

        sim.strike_lightning(id).unwrap();
        assert_eq!(sim.world().record(id).unwrap().kind(), EntityKind::ZombifiedPig);
    }

    #[test]
    fn test_facade_is_cached() {
        let (_, id, pipeline) = setup(EntityKind::Pig);
        let mut hooks = PigOverride::unbound(id, EntityKind::Pig, pipeline);
        assert!(!hooks.has_facade());
        let first = hooks.facade();
        let second = hooks.facade();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_push_listener_error_aborts_hook() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        bind(&mut sim, id, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));
        pipeline.register_listener(|_: &mut PushEvent| Err(ListenerError::new("no")));

        assert!(matches!(
            sim.push(id, Vec3::X),
            Err(HookError::Aborted { entity, .. }) if entity == id
        ));
        assert!(sim.has_hooks(id));
    }

    #[test]
    fn test_collision_event_reports_other() {
        let (mut sim, id, pipeline) = setup(EntityKind::Pig);
        bind(&mut sim, id, &pipeline, BasicNpc::new(NpcId(4), "Wilbur"));
        let cow = sim.spawn(EntityKind::Cow, Location::new(0.3, 64.0, 0.0)).unwrap();

        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        pipeline.register_listener(move |event: &mut CollisionEvent| {
            sink.set(Some(event.other()));
            Ok(())
        });

        sim.collide(id, cow).unwrap();
        let other = seen.get().unwrap();
        assert_eq!(other.id, cow);
        assert_eq!(other.kind, EntityKind::Cow);
        assert_eq!(other.npc, None);
    }
}
