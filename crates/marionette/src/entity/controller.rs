//! # Entity Controllers
//!
//! One controller per NPC. A controller spawns the host entity, installs a
//! bound override for it, and hands out the entity's facade.

use std::rc::Rc;

use marionette_core::{EntityId, EntityKind, HookError, Location, Simulation};

use super::facade::{EntityFacade, FacadeKind, MobFacade, PigFacade, PlayerFacade};
use super::hooked::EntityOverride;
use crate::error::{MarionetteError, MarionetteResult};
use crate::events::EventPipeline;
use crate::metadata::keys;
use crate::npc::NpcHandle;
use crate::util::parse_colors;

/// Spawns and owns the host entity of one NPC.
pub trait EntityController {
    /// Kind of entity this controller spawns.
    fn kind(&self) -> EntityKind;

    /// Spawns the entity at `at`, bound to `npc`, and returns its facade.
    ///
    /// # Errors
    ///
    /// - [`MarionetteError::AlreadySpawned`] if a previous entity is still alive
    /// - [`MarionetteError::SpawnFailed`] if the host world is full
    fn spawn(
        &mut self,
        sim: &mut Simulation,
        at: Location,
        npc: NpcHandle,
    ) -> MarionetteResult<Rc<dyn EntityFacade>>;

    /// Despawns the entity. Returns `false` if there was none.
    fn despawn(&mut self, sim: &mut Simulation) -> bool;

    /// The spawned entity, if any.
    fn entity(&self) -> Option<EntityId>;

    /// The facade of the spawned entity.
    ///
    /// # Errors
    ///
    /// - [`MarionetteError::NotSpawned`] without a live entity
    /// - [`MarionetteError::TypeMismatch`] if the installed hooks are not the
    ///   ones this controller installs
    fn facade(&self, sim: &mut Simulation) -> MarionetteResult<Rc<dyn EntityFacade>>;
}

/// Fetches the cached facade of `entity`, checking that its hooks are an
/// [`EntityOverride<F>`].
///
/// # Errors
///
/// - [`MarionetteError::NotSpawned`] if the entity has no hooks
/// - [`MarionetteError::TypeMismatch`] if the hooks are of another type
pub fn typed_facade<F: FacadeKind>(sim: &mut Simulation, entity: EntityId) -> MarionetteResult<Rc<F>> {
    let hooks = sim.hooks_mut(entity).ok_or(MarionetteError::NotSpawned)?;
    let found = hooks.type_name();
    hooks
        .as_any_mut()
        .downcast_mut::<EntityOverride<F>>()
        .map(EntityOverride::facade)
        .ok_or_else(|| MarionetteError::TypeMismatch {
            expected: std::any::type_name::<EntityOverride<F>>(),
            found,
        })
}

/// Spawns `kind` at `at` and installs a bound override for it.
fn spawn_bound<F: FacadeKind>(
    sim: &mut Simulation,
    kind: EntityKind,
    at: Location,
    npc: NpcHandle,
    pipeline: &Rc<EventPipeline>,
) -> MarionetteResult<(EntityId, Rc<F>)> {
    let entity = sim.spawn(kind, at).ok_or(MarionetteError::SpawnFailed { kind })?;
    let mut hooks = match EntityOverride::<F>::bound(sim.world_mut(), entity, npc, Rc::clone(pipeline)) {
        Ok(hooks) => hooks,
        Err(err) => {
            sim.despawn(entity);
            return Err(err.into());
        }
    };
    let facade = hooks.facade();
    sim.install_hooks(entity, Box::new(hooks));
    Ok((entity, facade))
}

/// Clears `slot` if its entity has died since the last call.
fn live_entity(sim: &Simulation, slot: &mut Option<EntityId>) -> Option<EntityId> {
    match *slot {
        Some(entity) if sim.world().is_alive(entity) => Some(entity),
        _ => {
            *slot = None;
            None
        }
    }
}

fn despawn_slot(sim: &mut Simulation, slot: &mut Option<EntityId>) -> bool {
    let Some(entity) = slot.take() else {
        return false;
    };
    let despawned = sim.despawn(entity);
    if despawned {
        tracing::info!(entity = %entity, "despawned npc entity");
    }
    despawned
}

// =============================================================================
// Human
// =============================================================================

/// Controller for player-type NPCs.
///
/// The spawned entity is named after the NPC, skipped by the sleep check, and
/// one tick after spawning is listed on or removed from the player list
/// according to the NPC's `removefromplayerlist` metadata.
pub struct HumanController {
    pipeline: Rc<EventPipeline>,
    remove_from_player_list: bool,
    entity: Option<EntityId>,
}

impl HumanController {
    /// Creates a controller. `remove_from_player_list` is the default used
    /// when the NPC's metadata does not say.
    #[must_use]
    pub fn new(pipeline: Rc<EventPipeline>, remove_from_player_list: bool) -> Self {
        Self {
            pipeline,
            remove_from_player_list,
            entity: None,
        }
    }

    /// The player facade of the spawned entity.
    ///
    /// # Errors
    ///
    /// As [`EntityController::facade`].
    pub fn player_facade(&self, sim: &mut Simulation) -> MarionetteResult<Rc<PlayerFacade>> {
        let entity = self.entity.ok_or(MarionetteError::NotSpawned)?;
        typed_facade::<PlayerFacade>(sim, entity)
    }
}

impl EntityController for HumanController {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn spawn(
        &mut self,
        sim: &mut Simulation,
        at: Location,
        npc: NpcHandle,
    ) -> MarionetteResult<Rc<dyn EntityFacade>> {
        if let Some(entity) = live_entity(sim, &mut self.entity) {
            return Err(MarionetteError::AlreadySpawned(entity));
        }
        let name = parse_colors(npc.try_borrow().map_err(|_| MarionetteError::NpcBusy)?.full_name());

        let (entity, facade) =
            spawn_bound::<PlayerFacade>(sim, EntityKind::Player, at, Rc::clone(&npc), &self.pipeline)?;
        // Freshly spawned, so the record exists.
        let _ = sim.world_mut().set_name(entity, Some(name));

        let default = self.remove_from_player_list;
        sim.schedule_after_ticks(1, move |sim| {
            if !sim.world().is_alive(entity) {
                tracing::warn!(entity = %entity, "npc entity gone before player list update");
                return Ok(());
            }
            let remove = npc
                .try_borrow()
                .map_err(|_| HookError::NpcBusy(entity))?
                .data()
                .get(keys::REMOVE_FROM_PLAYER_LIST, default);
            // Liveness checked above.
            let _ = sim.world_mut().set_listed(entity, !remove);
            tracing::debug!(entity = %entity, listed = !remove, "applied player list visibility");
            Ok(())
        });

        // Players always have a sleep check.
        let _ = facade.set_sleeping_ignored(sim.world_mut(), true);
        self.entity = Some(entity);
        tracing::info!(entity = %entity, kind = %EntityKind::Player, "spawned npc entity");
        Ok(facade)
    }

    fn despawn(&mut self, sim: &mut Simulation) -> bool {
        despawn_slot(sim, &mut self.entity)
    }

    fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    fn facade(&self, sim: &mut Simulation) -> MarionetteResult<Rc<dyn EntityFacade>> {
        Ok(self.player_facade(sim)?)
    }
}

// =============================================================================
// Mobs
// =============================================================================

/// Controller for mob-type NPCs, generic over the facade they expose.
pub struct MobController<F: FacadeKind> {
    kind: EntityKind,
    pipeline: Rc<EventPipeline>,
    entity: Option<EntityId>,
    _facade: std::marker::PhantomData<fn() -> F>,
}

/// Controller for pig NPCs.
pub type PigController = MobController<PigFacade>;
/// Controller for cows, sheep, villagers and zombies.
pub type GenericMobController = MobController<MobFacade>;

impl<F: FacadeKind> MobController<F> {
    /// Creates a controller spawning `kind`.
    #[must_use]
    pub fn new(kind: EntityKind, pipeline: Rc<EventPipeline>) -> Self {
        Self {
            kind,
            pipeline,
            entity: None,
            _facade: std::marker::PhantomData,
        }
    }

    /// The typed facade of the spawned entity.
    ///
    /// # Errors
    ///
    /// As [`EntityController::facade`].
    pub fn typed_facade(&self, sim: &mut Simulation) -> MarionetteResult<Rc<F>> {
        let entity = self.entity.ok_or(MarionetteError::NotSpawned)?;
        typed_facade::<F>(sim, entity)
    }
}

impl PigController {
    /// Creates a pig controller.
    #[must_use]
    pub fn pig(pipeline: Rc<EventPipeline>) -> Self {
        Self::new(EntityKind::Pig, pipeline)
    }
}

impl<F: FacadeKind> EntityController for MobController<F> {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn spawn(
        &mut self,
        sim: &mut Simulation,
        at: Location,
        npc: NpcHandle,
    ) -> MarionetteResult<Rc<dyn EntityFacade>> {
        if let Some(entity) = live_entity(sim, &mut self.entity) {
            return Err(MarionetteError::AlreadySpawned(entity));
        }
        let (entity, facade) = spawn_bound::<F>(sim, self.kind, at, npc, &self.pipeline)?;
        self.entity = Some(entity);
        tracing::info!(entity = %entity, kind = %self.kind, "spawned npc entity");
        Ok(facade)
    }

    fn despawn(&mut self, sim: &mut Simulation) -> bool {
        despawn_slot(sim, &mut self.entity)
    }

    fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    fn facade(&self, sim: &mut Simulation) -> MarionetteResult<Rc<dyn EntityFacade>> {
        Ok(self.typed_facade(sim)?)
    }
}
