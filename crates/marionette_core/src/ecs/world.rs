//! # Host World
//!
//! The record store the host owns: one slot per entity, physical state in
//! dense component storages, everything else on the [`EntityRecord`].

use super::component::{Motion, Position, Rotation, Vitals};
use super::entity::{EntityId, EntityKind};
use super::storage::ComponentStorage;
use crate::ai::{self, Goal, TargetGoal};
use crate::math::{Location, Vec3};

/// Non-physical state of one entity slot.
#[derive(Clone, Debug)]
pub struct EntityRecord {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) alive: bool,
    pub(crate) name: Option<String>,
    pub(crate) goals: Vec<Goal>,
    pub(crate) targets: Vec<TargetGoal>,
    pub(crate) selectors_locked: bool,
    pub(crate) sleeping_ignored: bool,
    pub(crate) saddled: bool,
}

impl EntityRecord {
    fn vacant(id: EntityId) -> Self {
        Self {
            id,
            kind: EntityKind::Pig,
            alive: false,
            name: None,
            goals: Vec::new(),
            targets: Vec::new(),
            selectors_locked: false,
            sleeping_ignored: false,
            saddled: false,
        }
    }

    /// Id currently occupying this slot.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Native type of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Display name, if one was assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Goal selector contents.
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Target selector contents.
    #[must_use]
    pub fn targets(&self) -> &[TargetGoal] {
        &self.targets
    }

    /// `true` once the selectors were locked; they stay empty from then on.
    #[must_use]
    pub const fn selectors_locked(&self) -> bool {
        self.selectors_locked
    }

    /// Whether the sleep check skips this entity.
    #[must_use]
    pub const fn sleeping_ignored(&self) -> bool {
        self.sleeping_ignored
    }

    /// Whether the entity wears a saddle.
    #[must_use]
    pub const fn saddled(&self) -> bool {
        self.saddled
    }
}

/// Container for every host entity.
///
/// Capacity is fixed at creation. Slots are recycled through a free list and
/// every reuse bumps the slot generation, so ids held across a despawn go
/// stale instead of aliasing the new occupant.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new(64);
/// let pig = world.spawn(EntityKind::Pig, Location::new(0.0, 64.0, 0.0)).unwrap();
/// world.add_motion(pig, Vec3::X);
/// ```
pub struct World {
    pub(crate) records: Box<[EntityRecord]>,
    free_indices: Vec<u32>,
    alive_count: usize,
    positions: ComponentStorage<Position>,
    motions: ComponentStorage<Motion>,
    rotations: ComponentStorage<Rotation>,
    vitals: ComponentStorage<Vitals>,
    /// Player list, in join order.
    roster: Vec<EntityId>,
}

impl World {
    /// Creates a world with room for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        let slots = u32::try_from(capacity).expect("Capacity cannot exceed u32::MAX");

        let records = (0..slots)
            .map(|index| EntityRecord::vacant(EntityId::new(index, 0)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            records,
            free_indices: (0..slots).rev().collect(),
            alive_count: 0,
            positions: ComponentStorage::new(capacity),
            motions: ComponentStorage::new(capacity),
            rotations: ComponentStorage::new(capacity),
            vitals: ComponentStorage::new(capacity),
            roster: Vec::new(),
        }
    }

    /// Maximum number of simultaneously alive entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Spawns a native entity of `kind` at `at`.
    ///
    /// The record gets the kind's default selectors. Players join the roster.
    /// Returns `None` when the world is full.
    pub fn spawn(&mut self, kind: EntityKind, at: Location) -> Option<EntityId> {
        let index = self.free_indices.pop()?;
        let idx = index as usize;

        let generation = self.records[idx].id.generation().wrapping_add(1);
        let id = EntityId::new(index, generation);

        let record = &mut self.records[idx];
        *record = EntityRecord::vacant(id);
        record.kind = kind;
        record.alive = true;
        record.goals = ai::default_goals(kind);
        record.targets = ai::default_targets(kind);

        self.positions.set(idx, Position(at.position()));
        self.motions.reset(idx);
        self.rotations.set(
            idx,
            Rotation {
                yaw: at.yaw,
                pitch: at.pitch,
            },
        );
        self.vitals.set(idx, Vitals::with_health(kind.max_health()));
        if kind == EntityKind::Player {
            self.roster.push(id);
        }
        self.alive_count += 1;

        tracing::trace!(entity = %id, %kind, "spawned native entity");
        Some(id)
    }

    /// Despawns an entity, freeing its slot.
    ///
    /// Returns `false` if the id is stale or already dead.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(idx) = self.slot(id) else {
            return false;
        };

        self.records[idx] = EntityRecord::vacant(id);
        self.positions.reset(idx);
        self.motions.reset(idx);
        self.rotations.reset(idx);
        self.vitals.reset(idx);
        self.roster.retain(|listed| *listed != id);
        self.free_indices.push(id.index());
        self.alive_count -= 1;

        tracing::trace!(entity = %id, "despawned entity");
        true
    }

    /// Slot index for `id` if it refers to a live entity.
    #[inline]
    fn slot(&self, id: EntityId) -> Option<usize> {
        let idx = id.index() as usize;
        let record = self.records.get(idx)?;
        (record.alive && record.id == id).then_some(idx)
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    /// Record of a live entity.
    #[must_use]
    pub fn record(&self, id: EntityId) -> Option<&EntityRecord> {
        self.slot(id).map(|idx| &self.records[idx])
    }

    pub(crate) fn record_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.slot(id).map(|idx| &mut self.records[idx])
    }

    /// Ids of all live entities, in slot order.
    pub fn alive_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records.iter().filter(|r| r.alive).map(|r| r.id)
    }

    // =========================================================================
    // Physical state
    // =========================================================================

    /// Current position.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        let idx = self.slot(id)?;
        self.positions.get(idx).map(|p| p.0)
    }

    /// Current motion.
    #[must_use]
    pub fn motion(&self, id: EntityId) -> Option<Vec3> {
        let idx = self.slot(id)?;
        self.motions.get(idx).map(|m| m.0)
    }

    /// Current facing.
    #[must_use]
    pub fn rotation(&self, id: EntityId) -> Option<Rotation> {
        let idx = self.slot(id)?;
        self.rotations.get(idx).copied()
    }

    /// Current health and burning state.
    #[must_use]
    pub fn vitals(&self, id: EntityId) -> Option<Vitals> {
        let idx = self.slot(id)?;
        self.vitals.get(idx).copied()
    }

    /// Position plus facing.
    #[must_use]
    pub fn location(&self, id: EntityId) -> Option<Location> {
        let pos = self.position(id)?;
        let rot = self.rotation(id)?;
        Some(Location::new(pos.x, pos.y, pos.z).with_rotation(rot.yaw, rot.pitch))
    }

    /// Moves an entity to `to`, adopting its facing.
    pub fn teleport(&mut self, id: EntityId, to: Location) -> bool {
        let Some(idx) = self.slot(id) else {
            return false;
        };
        self.positions.set(idx, Position(to.position()));
        self.rotations.set(
            idx,
            Rotation {
                yaw: to.yaw,
                pitch: to.pitch,
            },
        )
    }

    /// Overwrites an entity's position.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.slot(id) {
            Some(idx) => self.positions.set(idx, Position(position)),
            None => false,
        }
    }

    /// Overwrites an entity's motion.
    pub fn set_motion(&mut self, id: EntityId, motion: Vec3) -> bool {
        match self.slot(id) {
            Some(idx) => self.motions.set(idx, Motion(motion)),
            None => false,
        }
    }

    /// Adds `delta` to an entity's motion.
    pub fn add_motion(&mut self, id: EntityId, delta: Vec3) -> bool {
        let Some(idx) = self.slot(id) else {
            return false;
        };
        match self.motions.get_mut(idx) {
            Some(motion) => {
                motion.0 += delta;
                true
            }
            None => false,
        }
    }

    /// Overwrites an entity's facing.
    pub fn set_rotation(&mut self, id: EntityId, yaw: f32, pitch: f32) -> bool {
        match self.slot(id) {
            Some(idx) => self.rotations.set(idx, Rotation { yaw, pitch }),
            None => false,
        }
    }

    /// Subtracts `amount` health, clamping at zero.
    pub fn damage(&mut self, id: EntityId, amount: f32) -> bool {
        let Some(idx) = self.slot(id) else {
            return false;
        };
        match self.vitals.get_mut(idx) {
            Some(vitals) => {
                vitals.health = (vitals.health - amount).max(0.0);
                true
            }
            None => false,
        }
    }

    /// Sets the entity burning for at least `ticks` ticks.
    pub fn ignite(&mut self, id: EntityId, ticks: u32) -> bool {
        let Some(idx) = self.slot(id) else {
            return false;
        };
        match self.vitals.get_mut(idx) {
            Some(vitals) => {
                vitals.fire_ticks = vitals.fire_ticks.max(ticks);
                true
            }
            None => false,
        }
    }

    pub(crate) fn vitals_mut(&mut self, id: EntityId) -> Option<&mut Vitals> {
        let idx = self.slot(id)?;
        self.vitals.get_mut(idx)
    }

    // =========================================================================
    // AI selectors
    // =========================================================================

    /// Empties both selectors and prevents them from ever being refilled.
    pub fn lock_selectors(&mut self, id: EntityId) -> bool {
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        record.goals.clear();
        record.targets.clear();
        record.selectors_locked = true;
        true
    }

    /// Appends a goal. Refused (returns `false`) once the selectors are locked.
    pub fn add_goal(&mut self, id: EntityId, goal: Goal) -> bool {
        match self.record_mut(id) {
            Some(record) if !record.selectors_locked => {
                record.goals.push(goal);
                true
            }
            _ => false,
        }
    }

    /// Appends a target goal. Refused once the selectors are locked.
    pub fn add_target(&mut self, id: EntityId, target: TargetGoal) -> bool {
        match self.record_mut(id) {
            Some(record) if !record.selectors_locked => {
                record.targets.push(target);
                true
            }
            _ => false,
        }
    }

    /// Changes the kind of a live entity in place.
    ///
    /// Unlocked selectors are reset to the new kind's defaults.
    pub(crate) fn convert(&mut self, id: EntityId, kind: EntityKind) -> bool {
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        record.kind = kind;
        if !record.selectors_locked {
            record.goals = ai::default_goals(kind);
            record.targets = ai::default_targets(kind);
        }
        true
    }

    // =========================================================================
    // Roster and flags
    // =========================================================================

    /// The player list, in join order.
    #[must_use]
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    /// Whether the entity is on the player list.
    #[must_use]
    pub fn is_listed(&self, id: EntityId) -> bool {
        self.roster.contains(&id)
    }

    /// Adds the entity to, or removes it from, the player list. Returns
    /// `false` for a dead entity.
    #[must_use]
    pub fn set_listed(&mut self, id: EntityId, listed: bool) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let present = self.is_listed(id);
        if listed && !present {
            self.roster.push(id);
        } else if !listed && present {
            self.roster.retain(|other| *other != id);
        }
        true
    }

    /// Sets or clears the display name.
    #[must_use]
    pub fn set_name(&mut self, id: EntityId, name: Option<String>) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.name = name;
                true
            }
            None => false,
        }
    }

    /// Excludes the entity from (or includes it in) the sleep check. Only
    /// sleeping kinds have one.
    #[must_use]
    pub fn set_sleeping_ignored(&mut self, id: EntityId, ignored: bool) -> bool {
        match self.record_mut(id) {
            Some(record) if record.kind.can_sleep() => {
                record.sleeping_ignored = ignored;
                true
            }
            _ => false,
        }
    }

    /// Puts on or takes off a saddle. Only pigs wear saddles.
    #[must_use]
    pub fn set_saddled(&mut self, id: EntityId, saddled: bool) -> bool {
        match self.record_mut(id) {
            Some(record) if record.kind == EntityKind::Pig => {
                record.saddled = saddled;
                true
            }
            _ => false,
        }
    }

    /// Closest live entity of `kind` within `range` of `from`, excluding `exclude`.
    #[must_use]
    pub fn nearest(
        &self,
        kind: EntityKind,
        from: Vec3,
        range: f64,
        exclude: EntityId,
    ) -> Option<EntityId> {
        let range_sq = range * range;
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive && r.kind == kind && r.id != exclude)
            .filter_map(|(idx, r)| {
                let dist = self.positions.get(idx)?.0.distance_squared(from);
                (dist <= range_sq).then_some((r.id, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Location {
        Location::new(0.0, 64.0, 0.0)
    }

    #[test]
    fn test_spawn_despawn_recycles_slot() {
        let mut world = World::new(4);

        let a = world.spawn(EntityKind::Pig, origin()).unwrap();
        assert!(world.is_alive(a));
        assert_eq!(world.alive_count(), 1);

        assert!(world.despawn(a));
        assert!(!world.is_alive(a));
        assert!(!world.despawn(a));

        let b = world.spawn(EntityKind::Cow, origin()).unwrap();
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(world.record(a).is_none());
    }

    #[test]
    fn test_spawn_fails_when_full() {
        let mut world = World::new(1);
        assert!(world.spawn(EntityKind::Pig, origin()).is_some());
        assert!(world.spawn(EntityKind::Pig, origin()).is_none());
    }

    #[test]
    fn test_players_join_roster() {
        let mut world = World::new(4);
        let player = world.spawn(EntityKind::Player, origin()).unwrap();
        let pig = world.spawn(EntityKind::Pig, origin()).unwrap();

        assert_eq!(world.roster(), &[player]);
        assert!(!world.is_listed(pig));

        assert!(world.set_listed(player, false));
        assert!(world.roster().is_empty());
        assert!(world.set_listed(player, true));
        assert!(world.set_listed(player, true));
        assert_eq!(world.roster(), &[player]);

        world.despawn(player);
        assert!(world.roster().is_empty());
    }

    #[test]
    fn test_locked_selectors_refuse_goals() {
        let mut world = World::new(2);
        let zombie = world.spawn(EntityKind::Zombie, origin()).unwrap();
        assert!(!world.record(zombie).unwrap().goals().is_empty());

        assert!(world.lock_selectors(zombie));
        let record = world.record(zombie).unwrap();
        assert!(record.goals().is_empty());
        assert!(record.targets().is_empty());

        assert!(!world.add_goal(zombie, Goal::LookAround { chance: 1.0 }));
        assert!(!world.add_target(zombie, TargetGoal::NearestPlayer { range: 4.0, speed: 0.1 }));
        assert!(world.record(zombie).unwrap().goals().is_empty());
    }

    #[test]
    fn test_flags_respect_kind() {
        let mut world = World::new(2);
        let player = world.spawn(EntityKind::Player, origin()).unwrap();
        let pig = world.spawn(EntityKind::Pig, origin()).unwrap();

        assert!(world.set_sleeping_ignored(player, true));
        assert!(!world.set_sleeping_ignored(pig, true));
        assert!(world.set_saddled(pig, true));
        assert!(!world.set_saddled(player, true));
        assert!(world.record(pig).unwrap().saddled());
    }

    #[test]
    fn test_nearest_excludes_self_and_range() {
        let mut world = World::new(4);
        let zombie = world.spawn(EntityKind::Zombie, origin()).unwrap();
        let near = world.spawn(EntityKind::Player, Location::new(3.0, 64.0, 0.0)).unwrap();
        let _far = world.spawn(EntityKind::Player, Location::new(30.0, 64.0, 0.0)).unwrap();

        let from = world.position(zombie).unwrap();
        assert_eq!(world.nearest(EntityKind::Player, from, 10.0, zombie), Some(near));
        assert_eq!(world.nearest(EntityKind::Player, from, 1.0, zombie), None);
    }
}
