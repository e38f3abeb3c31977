//! # Simulation
//!
//! The host's tick driver. Owns the [`World`], the hook table, the deferred
//! task queue and the random source, and is the only path through which
//! entities are ticked, pushed, struck or collided.
//!
//! ## Step order
//!
//! 1. Advance the tick counter
//! 2. Run every deferred task due on the new tick
//! 3. Tick every live entity, in slot order
//! 4. Resolve collisions between overlapping entities

use rand::RngCore;

use crate::ecs::{EntityId, EntityKind, World};
use crate::error::{HookError, HookResult};
use crate::hooks::EntityHooks;
use crate::math::{Location, Vec3};
use crate::native;
use crate::random::RandomSource;
use crate::scheduler::{TaskId, TickScheduler};

/// Work queued to run at the start of a later step.
pub type DeferredTask = Box<dyn FnOnce(&mut Simulation) -> HookResult>;

/// An installed hook object and the entity it belongs to.
struct HookEntry {
    owner: EntityId,
    hooks: Box<dyn EntityHooks>,
}

/// The host simulation.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = Simulation::new(64, &RandomSource::default());
/// let pig = sim.spawn(EntityKind::Pig, Location::new(0.0, 64.0, 0.0)).unwrap();
/// sim.push(pig, Vec3::X)?;
/// sim.step()?;
/// ```
pub struct Simulation {
    world: World,
    hooks: Box<[Option<HookEntry>]>,
    scheduler: TickScheduler<DeferredTask>,
    rng: Box<dyn RngCore>,
    tick: u64,
    scratch: Vec<EntityId>,
}

impl Simulation {
    /// Creates a simulation with room for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize, random: &RandomSource) -> Self {
        Self::with_rng(capacity, random.build())
    }

    /// Creates a simulation driven by an existing generator.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn with_rng(capacity: usize, rng: Box<dyn RngCore>) -> Self {
        let world = World::new(capacity);
        let hooks = std::iter::repeat_with(|| None)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            world,
            hooks,
            scheduler: TickScheduler::new(),
            rng,
            tick: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Entity records.
    #[inline]
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable entity records. Changes made here bypass every hook.
    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The simulation's random source.
    #[inline]
    pub fn rng_mut(&mut self) -> &mut dyn RngCore {
        self.rng.as_mut()
    }

    /// Records and random source at once, for native behaviors that need
    /// both.
    #[inline]
    pub fn world_and_rng(&mut self) -> (&mut World, &mut dyn RngCore) {
        (&mut self.world, self.rng.as_mut())
    }

    /// Number of completed steps.
    #[inline]
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Number of deferred tasks still pending.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns a native entity. Returns `None` when the world is full.
    pub fn spawn(&mut self, kind: EntityKind, at: Location) -> Option<EntityId> {
        let id = self.world.spawn(kind, at)?;
        if let Some(slot) = self.hooks.get_mut(id.index() as usize) {
            *slot = None;
        }
        Some(id)
    }

    /// Despawns an entity and drops its hooks.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.remove_hooks(id);
        self.world.despawn(id)
    }

    // =========================================================================
    // Hook table
    // =========================================================================

    /// Installs `hooks` for a live entity, replacing any previous entry.
    ///
    /// Returns `false` (and drops `hooks`) if the entity is not alive.
    pub fn install_hooks(&mut self, id: EntityId, hooks: Box<dyn EntityHooks>) -> bool {
        if !self.world.is_alive(id) {
            return false;
        }
        let Some(slot) = self.hooks.get_mut(id.index() as usize) else {
            return false;
        };
        tracing::debug!(entity = %id, hooks = hooks.type_name(), "installed hooks");
        *slot = Some(HookEntry { owner: id, hooks });
        true
    }

    /// Removes and returns the hooks of `id`.
    pub fn remove_hooks(&mut self, id: EntityId) -> Option<Box<dyn EntityHooks>> {
        let slot = self.hooks.get_mut(id.index() as usize)?;
        if slot.as_ref().is_some_and(|entry| entry.owner == id) {
            slot.take().map(|entry| entry.hooks)
        } else {
            None
        }
    }

    /// Whether `id` has hooks installed (and not currently running).
    #[must_use]
    pub fn has_hooks(&self, id: EntityId) -> bool {
        self.hooks(id).is_some()
    }

    /// Installed hooks of `id`.
    #[must_use]
    pub fn hooks(&self, id: EntityId) -> Option<&dyn EntityHooks> {
        match self.hooks.get(id.index() as usize)? {
            Some(entry) if entry.owner == id => Some(entry.hooks.as_ref()),
            _ => None,
        }
    }

    /// Installed hooks of `id`, mutably.
    pub fn hooks_mut(&mut self, id: EntityId) -> Option<&mut dyn EntityHooks> {
        match self.hooks.get_mut(id.index() as usize)? {
            Some(entry) if entry.owner == id => Some(entry.hooks.as_mut()),
            _ => None,
        }
    }

    /// Takes the hooks out of the table, runs `call`, and puts them back if the
    /// entity survived and nothing else was installed meanwhile. Without an
    /// entry (or while the entry is already out) `native` runs instead.
    fn dispatch<C, N>(&mut self, id: EntityId, call: C, native: N) -> HookResult
    where
        C: FnOnce(&mut dyn EntityHooks, &mut Self) -> HookResult,
        N: FnOnce(&mut Self) -> HookResult,
    {
        if !self.world.is_alive(id) {
            return Err(HookError::DeadEntity(id));
        }

        let Some(mut hooks) = self.remove_hooks(id) else {
            return native(self);
        };

        let result = call(hooks.as_mut(), self);

        if self.world.is_alive(id) {
            if let Some(slot) = self.hooks.get_mut(id.index() as usize) {
                if slot.is_none() {
                    *slot = Some(HookEntry { owner: id, hooks });
                }
            }
        }
        result
    }

    // =========================================================================
    // Hooked entry points
    // =========================================================================

    /// Ticks one entity through its hooks.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive, or whatever the hook
    /// returns.
    pub fn tick_entity(&mut self, id: EntityId) -> HookResult {
        self.dispatch(
            id,
            |hooks, sim| hooks.on_tick(sim, id),
            |sim| crate::hooks::defaults::tick(sim, id),
        )
    }

    /// Pushes an entity through its hooks.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive, or whatever the hook
    /// returns.
    pub fn push(&mut self, id: EntityId, push: Vec3) -> HookResult {
        self.dispatch(
            id,
            |hooks, sim| hooks.on_external_push(sim, id, push),
            |sim| crate::hooks::defaults::push(sim, id, push),
        )
    }

    /// Strikes an entity with lightning through its hooks.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive, or whatever the hook
    /// returns.
    pub fn strike_lightning(&mut self, id: EntityId) -> HookResult {
        self.dispatch(
            id,
            |hooks, sim| hooks.on_lightning_strike(sim, id),
            |sim| crate::hooks::defaults::lightning_strike(sim, id),
        )
    }

    /// Lets `id` collide with `other` through `id`'s hooks.
    ///
    /// # Errors
    ///
    /// [`HookError::DeadEntity`] if `id` is not alive, or whatever the hooks
    /// return.
    pub fn collide(&mut self, id: EntityId, other: EntityId) -> HookResult {
        self.dispatch(
            id,
            |hooks, sim| hooks.on_collide_with_entity(sim, id, other),
            |sim| native_collide(sim, id, other),
        )
    }

    // =========================================================================
    // Deferred tasks
    // =========================================================================

    /// Queues `task` to run at the start of the step `ticks` ticks from now.
    ///
    /// A delay of zero is treated as one: a task never runs during the step
    /// that scheduled it.
    pub fn schedule_after_ticks<F>(&mut self, ticks: u64, task: F) -> TaskId
    where
        F: FnOnce(&mut Self) -> HookResult + 'static,
    {
        let due = self.tick.saturating_add(ticks.max(1));
        self.scheduler.schedule(due, Box::new(task))
    }

    /// Cancels a pending deferred task.
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id)
    }

    // =========================================================================
    // Step
    // =========================================================================

    /// Runs one full step and returns the new tick number.
    ///
    /// # Errors
    ///
    /// The first error any deferred task or hook returns. Every task due on
    /// the new tick still runs; entity ticks and collisions are skipped.
    pub fn step(&mut self) -> Result<u64, HookError> {
        self.tick += 1;

        let mut failed = None;
        for task in self.scheduler.drain_due(self.tick) {
            if let Err(err) = task(self) {
                tracing::warn!(tick = self.tick, error = %err, "deferred task failed");
                failed.get_or_insert(err);
            }
        }
        if let Some(err) = failed {
            return Err(err);
        }

        let mut ids = std::mem::take(&mut self.scratch);
        ids.clear();
        ids.extend(self.world.alive_ids());
        let ticked = ids.iter().try_for_each(|&id| {
            if self.world.is_alive(id) {
                self.tick_entity(id)
            } else {
                Ok(())
            }
        });
        self.scratch = ids;
        ticked?;

        for (a, b) in native::overlapping_pairs(&self.world) {
            if self.world.is_alive(a) && self.world.is_alive(b) {
                self.collide(a, b)?;
            }
            if self.world.is_alive(a) && self.world.is_alive(b) {
                self.collide(b, a)?;
            }
        }

        tracing::trace!(tick = self.tick, alive = self.world.alive_count(), "step complete");
        Ok(self.tick)
    }
}

/// Collision for an entity without hooks: its own half goes straight into its
/// motion, `other`'s half through the hook table.
fn native_collide(sim: &mut Simulation, id: EntityId, other: EntityId) -> HookResult {
    let Some(shove) = native::collision_shove(sim.world(), id, other) else {
        return Ok(());
    };
    crate::hooks::defaults::push(sim, id, -shove)?;
    if sim.world().is_alive(other) {
        sim.push(other, shove)?;
    }
    Ok(())
}
